use clap::Parser;
use glam::{Vec2, Vec3, vec2, vec3};
use log::info;
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use std::time::{Duration, Instant};

use colfill_rs::{
    config::{DEFAULT_AFFINE_SPAN, RasterConfig, ZDivide},
    renderer::{Renderer, Software},
    world::{
        CamVertex, Camera, Palette, Polygon, Texture,
        texture::{DEFAULT_COLORMAP, MAX_INTENSITY},
    },
};

const EYE_HEIGHT: f32 = 41.0;
const TILE: f32 = 64.0;
const GRID: i32 = 12;
const MOVE_SPEED: f32 = 6.0;
const TURN_SPEED: f32 = 0.05;

/// Walk around a small polygon scene drawn by the column rasterizer.
#[derive(Parser, Debug)]
#[command(name = "view_poly", version, about = "Software polygon viewer")]
struct Args {
    #[arg(long, default_value_t = 960)]
    width: usize,

    #[arg(long, default_value_t = 600)]
    height: usize,

    /// Plain affine texturing with linear depth
    #[arg(long)]
    affine: bool,

    /// Pixels between two exact perspective divides
    #[arg(long, default_value_t = DEFAULT_AFFINE_SPAN)]
    affine_span: u32,

    #[arg(long, value_enum, default_value_t = ZDivide::Fixed)]
    z_divide: ZDivide,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Surface kinds the scene can hold.
#[derive(Clone, Copy, Debug)]
enum Surface {
    Floor,
    Pillar(u8),
    Marker(u8),
}

struct Face {
    verts: Vec<CamVertex>,
    surface: Surface,
}

/// World-space quad with texel-unit UVs; `intensity` per corner.
fn face(corners: [Vec3; 4], uv: [Vec2; 4], intensity: [f32; 4], surface: Surface) -> Face {
    let verts = corners
        .iter()
        .zip(uv)
        .zip(intensity)
        .map(|((&pos, uv), intensity)| CamVertex { pos, uv, intensity })
        .collect();
    Face { verts, surface }
}

fn build_scene() -> Vec<Face> {
    let mut faces = Vec::new();

    /* floor tiles, lit brighter towards the middle */
    let light = |x: f32, y: f32| MAX_INTENSITY - (x.hypot(y) / 24.0).min(MAX_INTENSITY - 4.0);
    for gx in -GRID..GRID {
        for gy in -GRID..GRID {
            let (x0, y0) = (gx as f32 * TILE, gy as f32 * TILE);
            let (x1, y1) = (x0 + TILE, y0 + TILE);
            faces.push(face(
                [
                    vec3(x0, y0, 0.0),
                    vec3(x1, y0, 0.0),
                    vec3(x1, y1, 0.0),
                    vec3(x0, y1, 0.0),
                ],
                [vec2(0.0, 0.0), vec2(TILE, 0.0), vec2(TILE, TILE), vec2(0.0, TILE)],
                [light(x0, y0), light(x1, y0), light(x1, y1), light(x0, y1)],
                Surface::Floor,
            ));
        }
    }

    /* pillars: four shaded walls each, darker at the base */
    for (i, &(px, py)) in [(200.0, 0.0), (-150.0, 250.0), (0.0, -300.0), (350.0, 350.0)]
        .iter()
        .enumerate()
    {
        let hue = (i as u8 + 1) * 16;
        let r = 24.0;
        let top = 128.0;
        let corners = [
            vec2(px - r, py - r),
            vec2(px + r, py - r),
            vec2(px + r, py + r),
            vec2(px - r, py + r),
        ];
        for k in 0..4 {
            let a = corners[k];
            let b = corners[(k + 1) % 4];
            faces.push(face(
                [a.extend(top), b.extend(top), b.extend(0.0), a.extend(0.0)],
                [Vec2::ZERO; 4],
                [28.0, 28.0, 6.0, 6.0],
                Surface::Pillar(hue),
            ));
        }
    }

    /* floating marker quad, textured with a flat light level */
    faces.push(face(
        [
            vec3(100.0, -200.0, 96.0),
            vec3(100.0, -136.0, 96.0),
            vec3(100.0, -136.0, 32.0),
            vec3(100.0, -200.0, 32.0),
        ],
        [vec2(0.0, 0.0), vec2(64.0, 0.0), vec2(64.0, 64.0), vec2(0.0, 64.0)],
        [MAX_INTENSITY; 4],
        Surface::Marker(24),
    ));
    faces
}

fn floor_texture() -> anyhow::Result<Texture> {
    // stone-ish tiles out of two hue ramps
    let tex = Texture::from_fn("FLOOR", 64, 64, |x, y| {
        let border = x % 32 == 0 || y % 32 == 0;
        let shade = ((x * 7 + y * 13) % 5) as u8;
        if border { 8 * 16 + 4 } else { 9 * 16 + 8 + shade }
    })?;
    Ok(tex)
}

fn marker_texture() -> anyhow::Result<Texture> {
    let tex = Texture::from_fn("MARKER", 64, 64, |x, y| {
        if ((x / 8) ^ (y / 8)) & 1 == 0 { 4 * 16 + 15 } else { 2 * 16 + 10 }
    })?;
    Ok(tex)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let mut config = RasterConfig {
        perspective_correct: !args.affine,
        affine_span: args.affine_span,
        z_divide: args.z_divide,
    };
    let (w, h) = (args.width, args.height);
    info!("view_poly {w}x{h}, {config:?}");

    let palette = Palette::hue_ramps();
    let floor = floor_texture()?;
    let marker = marker_texture()?;
    let scene = build_scene();

    let mut renderer = Software::new(config);
    renderer.set_colormap((*DEFAULT_COLORMAP).clone());
    let mut camera = Camera::new(vec3(-400.0, 0.0, EYE_HEIGHT), 0.0, 90_f32.to_radians());

    let mut win = Window::new("colfill software polygons", w, h, WindowOptions::default())?;
    win.set_target_fps(35);

    let mut rgb = vec![0u32; w * h];
    let mut polys: Vec<(f32, Polygon, Surface)> = Vec::with_capacity(scene.len());

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* movement --------------------------------------------------------- */
        let mut forward = 0.0;
        let mut side = 0.0;
        if win.is_key_down(Key::Up) || win.is_key_down(Key::W) {
            forward += MOVE_SPEED;
        }
        if win.is_key_down(Key::Down) || win.is_key_down(Key::S) {
            forward -= MOVE_SPEED;
        }
        if win.is_key_down(Key::A) {
            side -= MOVE_SPEED;
        }
        if win.is_key_down(Key::D) {
            side += MOVE_SPEED;
        }
        if win.is_key_down(Key::Left) {
            camera.turn(TURN_SPEED);
        }
        if win.is_key_down(Key::Right) {
            camera.turn(-TURN_SPEED);
        }
        camera.step(forward, side);

        /* render-mode toggles ---------------------------------------------- */
        if win.is_key_pressed(Key::P, KeyRepeat::No) {
            config.perspective_correct = !config.perspective_correct;
            renderer.set_config(config);
            info!("perspective_correct = {}", config.perspective_correct);
        }
        if win.is_key_pressed(Key::Z, KeyRepeat::No) {
            config.z_divide = match config.z_divide {
                ZDivide::Fixed => ZDivide::Float,
                ZDivide::Float => ZDivide::Fixed,
            };
            renderer.set_config(config);
            info!("z_divide = {:?}", config.z_divide);
        }
        if win.is_key_pressed(Key::Equal, KeyRepeat::No) {
            config.affine_span = (config.affine_span * 2).min(256);
            renderer.set_config(config);
            info!("affine_span = {}", config.affine_span);
        }
        if win.is_key_pressed(Key::Minus, KeyRepeat::No) {
            config.affine_span = (config.affine_span / 2).max(1);
            renderer.set_config(config);
            info!("affine_span = {}", config.affine_span);
        }

        /* project, back-to-front ------------------------------------------- */
        let proj = camera.projector(w, h, config.perspective_correct);
        polys.clear();
        for f in &scene {
            let cam: Vec<CamVertex> = f
                .verts
                .iter()
                .map(|v| CamVertex {
                    pos: camera.to_cam(v.pos),
                    ..*v
                })
                .collect();
            let depth = cam.iter().map(|v| v.pos.z).sum::<f32>() / cam.len() as f32;
            let mut poly = Polygon::project(&cam, camera.near(), &proj);
            if poly.is_empty() {
                continue;
            }
            // every face is two-sided
            poly.wind_clockwise();
            polys.push((depth, poly, f.surface));
        }
        polys.sort_by(|a, b| b.0.total_cmp(&a.0));

        /* draw */
        renderer.begin_frame(w, h);
        for (_, poly, surface) in &polys {
            let call = match *surface {
                Surface::Floor => poly.shaded_texture(&floor),
                Surface::Pillar(hue) => poly.shaded_color(hue + 12),
                Surface::Marker(light) => poly.flat_texture(&marker, light),
            };
            renderer.draw_poly(&call);
        }

        let mut present = Ok(());
        renderer.end_frame(|fb, fw, fh| {
            for (dst, &idx) in rgb.iter_mut().zip(fb) {
                *dst = palette[idx as usize];
            }
            acc_time += t0.elapsed();
            acc_frames += 1;
            present = win.update_with_buffer(&rgb, fw, fh);
        });
        present?;

        if last_print.elapsed() >= Duration::from_secs(3) {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames as f64;
            let fps = 1000.0 / avg_ms;
            let stats = renderer.stats();
            println!(
                "avg render: {:.2} ms  ({:.1} FPS)  {} polys, {} rejected, {} px",
                avg_ms, fps, stats.polys_drawn, stats.polys_rejected, stats.pixels
            );
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
