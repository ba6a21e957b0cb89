//! 44.20 fixed-point numbers used by the column inner loops.
//!
//! * Stored in an `i64`, 20 fractional bits.
//! * `from_f32` **truncates toward zero**; every conversion in the
//!   rasterizer goes through it, so texel selection and dithering see the
//!   same rounding everywhere.
//! * `mul` / `div` rescale through an `i128` so no intermediate overflows.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

pub const FRAC_BITS: u32 = 20;

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(pub i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(1 << FRAC_BITS);
    pub const HALF: Fixed = Fixed(1 << (FRAC_BITS - 1));
    pub const MAX: Fixed = Fixed(i64::MAX);
    pub const MIN: Fixed = Fixed(i64::MIN);

    #[inline(always)]
    pub fn from_int(v: i32) -> Self {
        Fixed((v as i64) << FRAC_BITS)
    }

    /// Truncating conversion: anything below one ulp becomes `0`.
    #[inline(always)]
    pub fn from_f32(v: f32) -> Self {
        Fixed((v as f64 * (1u64 << FRAC_BITS) as f64) as i64)
    }

    #[inline(always)]
    pub fn from_f64(v: f64) -> Self {
        Fixed((v * (1u64 << FRAC_BITS) as f64) as i64)
    }

    #[inline(always)]
    pub fn to_f32(self) -> f32 {
        (self.0 as f64 / (1u64 << FRAC_BITS) as f64) as f32
    }

    /// Integer part, rounded toward −∞ (arithmetic shift).
    #[inline(always)]
    pub fn floor(self) -> i32 {
        (self.0 >> FRAC_BITS) as i32
    }

    #[inline(always)]
    pub fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(((self.0 as i128 * rhs.0 as i128) >> FRAC_BITS) as i64)
    }

    /// Fixed-point quotient, truncated toward zero.
    /// Division by zero saturates by the sign of the numerator.
    #[inline(always)]
    pub fn div(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            return if self.0 < 0 { Fixed::MIN } else { Fixed::MAX };
        }
        let q = ((self.0 as i128) << FRAC_BITS) / rhs.0 as i128;
        Fixed(q.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }

    #[inline(always)]
    pub fn recip(self) -> Fixed {
        Fixed::ONE.div(self)
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}
impl Sub for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}
impl AddAssign for Fixed {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}
impl SubAssign for Fixed {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}
impl Neg for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

/* plain integer scaling – no rescale */
impl Mul<i32> for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_mul(rhs as i64))
    }
}
impl Div<i32> for Fixed {
    type Output = Fixed;
    #[inline(always)]
    fn div(self, rhs: i32) -> Fixed {
        Fixed(self.0 / rhs as i64)
    }
}

/// Float → pixel rule shared by the bounding box and the edge walker:
/// `floor(x + 0.5)`, so pixel centres sit on integer coordinates and
/// negative coordinates round the same way as positive ones.
#[inline(always)]
pub fn round_px(x: f32) -> i32 {
    (x + 0.5).floor() as i32
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_truncates_toward_zero() {
        assert_eq!(Fixed::from_f32(1.5), Fixed(3 << 19));
        assert_eq!(Fixed::from_f32(2.0).floor(), 2);
        // 1 / 2^21 is below one ulp: truncated to zero either side
        assert_eq!(Fixed::from_f64(1.0 / 2097152.0), Fixed::ZERO);
        assert_eq!(Fixed::from_f64(-1.0 / 2097152.0), Fixed::ZERO);
    }

    #[test]
    fn floor_rounds_down_for_negatives() {
        assert_eq!(Fixed::from_f32(-0.25).floor(), -1);
        assert_eq!(Fixed::from_f32(-1.0).floor(), -1);
        assert_eq!(Fixed::from_f32(3.75).floor(), 3);
    }

    #[test]
    fn mul_div_rescale() {
        let a = Fixed::from_int(6);
        let b = Fixed::from_f32(0.5);
        assert_eq!(a.mul(b), Fixed::from_int(3));
        assert_eq!(a.div(b), Fixed::from_int(12));
        assert_eq!(Fixed::from_int(4).recip(), Fixed::from_f32(0.25));
    }

    #[test]
    fn large_operands_do_not_overflow() {
        // raw product is ~2^82, far past i64; the rescaled result fits
        let u = Fixed::from_int(4096 * 1024);
        let z = Fixed::from_int(1000);
        assert_eq!(u.mul(z), Fixed((4096i64 * 1024 * 1000) << FRAC_BITS));
        assert_eq!(u.mul(z).div(z), u);
    }

    #[test]
    fn div_by_zero_saturates() {
        assert_eq!(Fixed::ONE.div(Fixed::ZERO), Fixed::MAX);
        assert_eq!((-Fixed::ONE).div(Fixed::ZERO), Fixed::MIN);
    }

    #[test]
    fn integer_scaling_operators() {
        let d = Fixed::from_f32(0.25);
        assert_eq!(d * 4, Fixed::ONE);
        assert_eq!(Fixed::from_int(3) / 2, Fixed::from_f32(1.5));
    }

    #[test]
    fn pixel_rounding_uses_half_up() {
        assert_eq!(round_px(0.49), 0);
        assert_eq!(round_px(0.5), 1);
        assert_eq!(round_px(-0.5), 0);
        assert_eq!(round_px(-0.51), -1);
        assert_eq!(round_px(9.999), 10);
    }
}
