use clap::Parser;
use glam::{Vec2, vec2};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

use colfill_rs::{
    config::{DEFAULT_AFFINE_SPAN, RasterConfig, ZDivide},
    renderer::{DrawCall, FrameStats, Renderer, Software},
    world::{ProjVertex, Texture, texture::MAX_INTENSITY},
};

/// Headless fill-rate benchmark: the same batch of random convex polygons,
/// rendered again and again.
#[derive(Parser, Debug)]
#[command(name = "raster_bench", version, about = "Software rasterizer throughput")]
struct Args {
    #[arg(long, default_value_t = 640)]
    width: usize,

    #[arg(long, default_value_t = 400)]
    height: usize,

    #[arg(long, default_value_t = 300)]
    frames: usize,

    /// Polygons per frame
    #[arg(long, default_value_t = 400)]
    polys: usize,

    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    #[arg(long)]
    affine: bool,

    #[arg(long, default_value_t = DEFAULT_AFFINE_SPAN)]
    affine_span: u32,

    #[arg(long, value_enum, default_value_t = ZDivide::Fixed)]
    z_divide: ZDivide,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// One random polygon's buffers; `kind` picks the fill variant.
struct Batch {
    verts: Vec<ProjVertex>,
    uv: Vec<Vec2>,
    intensity: Vec<f32>,
    kind: u32,
    color: u8,
}

/// Convex n-gon around a random centre, wound clockwise on screen.
fn random_poly(rng: &mut ChaCha8Rng, w: f32, h: f32, perspective: bool) -> Batch {
    let n: u32 = rng.gen_range(3..9);
    let centre = vec2(rng.gen_range(-32.0..w + 32.0), rng.gen_range(-32.0..h + 32.0));
    let radius = rng.gen_range(4.0..96.0);
    let depth = rng.gen_range(1.0..64.0);
    let start = rng.gen_range(0.0..std::f32::consts::TAU);

    let mut b = Batch {
        verts: Vec::with_capacity(n as usize),
        uv: Vec::with_capacity(n as usize),
        intensity: Vec::with_capacity(n as usize),
        kind: rng.gen_range(0..4),
        color: rng.r#gen(),
    };
    for k in 0..n {
        // increasing angle with y down is clockwise on screen
        let a = start + k as f32 * std::f32::consts::TAU / n as f32;
        let (s, c) = a.sin_cos();
        let z = depth + rng.gen_range(0.0..4.0);
        let uv = vec2(c, s) * 32.0 + vec2(32.0, 32.0);
        let (z, uv) = if perspective {
            (1.0 / z, uv / z)
        } else {
            (z, uv)
        };
        b.verts.push(ProjVertex::new(centre.x + c * radius, centre.y + s * radius, z));
        b.uv.push(uv);
        b.intensity.push(rng.gen_range(0.0..=MAX_INTENSITY));
    }
    b
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let config = RasterConfig {
        perspective_correct: !args.affine,
        affine_span: args.affine_span,
        z_divide: args.z_divide,
    };
    info!(
        "raster_bench {}x{}, {} frames of {} polys, {config:?}",
        args.width, args.height, args.frames, args.polys
    );

    let tex = Texture::default();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let batch: Vec<Batch> = (0..args.polys)
        .map(|_| {
            random_poly(
                &mut rng,
                args.width as f32,
                args.height as f32,
                config.perspective_correct,
            )
        })
        .collect();

    let mut renderer = Software::new(config);
    let mut total = FrameStats::default();
    let mut elapsed = Duration::ZERO;
    let mut checksum = 0u64;

    for _ in 0..args.frames {
        let t0 = Instant::now();
        renderer.begin_frame(args.width, args.height);
        for b in &batch {
            let call = match b.kind {
                0 => DrawCall::FlatColor {
                    verts: &b.verts,
                    color: b.color,
                },
                1 => DrawCall::ShadedColor {
                    verts: &b.verts,
                    intensity: &b.intensity,
                    color: b.color,
                },
                2 => DrawCall::FlatTexture {
                    verts: &b.verts,
                    uv: &b.uv,
                    tex: &tex,
                    light: b.color & 31,
                },
                _ => DrawCall::ShadedTexture {
                    verts: &b.verts,
                    uv: &b.uv,
                    intensity: &b.intensity,
                    tex: &tex,
                },
            };
            renderer.draw_poly(&call);
        }
        renderer.end_frame(|fb, _, _| {
            elapsed += t0.elapsed();
            // keep the frame observable so the fills are not optimised away
            checksum = fb.iter().fold(checksum, |acc, &p| acc.rotate_left(5) ^ p as u64);
        });

        let s = renderer.stats();
        total.polys_drawn += s.polys_drawn;
        total.polys_rejected += s.polys_rejected;
        total.columns += s.columns;
        total.pixels += s.pixels;
    }

    let frames = args.frames.max(1) as f64;
    let ms = elapsed.as_secs_f64() * 1000.0 / frames;
    let mpix = total.pixels as f64 / elapsed.as_secs_f64().max(1e-9) / 1e6;
    println!("avg frame: {ms:.3} ms  ({:.1} FPS)", 1000.0 / ms.max(1e-9));
    println!(
        "per frame: {:.0} polys drawn, {:.0} rejected, {:.0} columns, {:.0} pixels",
        total.polys_drawn as f64 / frames,
        total.polys_rejected as f64 / frames,
        total.columns as f64 / frames,
        total.pixels as f64 / frames
    );
    println!("fill rate: {mpix:.1} Mpixel/s  checksum {checksum:016x}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_fixes_the_polygon_stream() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..16 {
            let (pa, pb) = (
                random_poly(&mut a, 640.0, 400.0, true),
                random_poly(&mut b, 640.0, 400.0, true),
            );
            assert_eq!(pa.verts, pb.verts);
            assert_eq!((pa.kind, pa.color), (pb.kind, pb.color));
        }
    }

    #[test]
    fn random_polygons_are_fillable() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
        for _ in 0..64 {
            let p = random_poly(&mut rng, 640.0, 400.0, false);
            let n = p.verts.len();
            assert!((3..9).contains(&n));
            assert!(p.kind < 4);
            assert_eq!((p.uv.len(), p.intensity.len()), (n, n));
            assert!(p.intensity.iter().all(|i| (0.0..=MAX_INTENSITY).contains(i)));
            // positive shoelace sum is the winding the rasterizer fills
            let area: f32 = (0..n)
                .map(|i| {
                    let (a, b) = (p.verts[i], p.verts[(i + 1) % n]);
                    a.x * b.y - b.x * a.y
                })
                .sum();
            assert!(area > 0.0);
        }
    }
}
