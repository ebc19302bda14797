//! Fixed-point arithmetic shared by the decoders and the pose evaluator
//!
//! Values are 20.12 signed fixed point, the native format of the target
//! geometry engine. Angles are binary angles where 65536 units make one full
//! turn, so angle arithmetic wraps for free.
//!
//! Nothing here allocates or touches floating point. The `f32` conversions
//! exist for tooling and tests only.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Number of fractional bits in a [`Fixed`] value
pub const FRACTION_BITS: u32 = 12;

const FRACTION_MASK: i32 = (1 << FRACTION_BITS) - 1;

/// 20.12 signed fixed-point number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fixed(i32);

impl Fixed {
    /// Zero
    pub const ZERO: Self = Self(0);
    /// One (4096 raw)
    pub const ONE: Self = Self(1 << FRACTION_BITS);
    /// One half
    pub const HALF: Self = Self(1 << (FRACTION_BITS - 1));
    /// Largest representable value
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value
    pub const MIN: Self = Self(i32::MIN);

    /// Wrap a raw 20.12 word
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw 20.12 word
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Convert an integer
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(FRACTION_BITS))
    }

    /// Convert from floating point, rounding to the nearest step
    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::ONE.0 as f32).round() as i32)
    }

    /// Convert to floating point
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::ONE.0 as f32
    }

    /// Integer part, rounding toward negative infinity
    pub const fn floor(self) -> i32 {
        self.0 >> FRACTION_BITS
    }

    /// Fractional part, always in `[0, 1)`
    pub const fn fract(self) -> Self {
        Self(self.0 & FRACTION_MASK)
    }

    /// Clamp into `[0, 1]`
    pub fn clamp_unit(self) -> Self {
        self.clamp(Self::ZERO, Self::ONE)
    }

    /// Divide, returning `None` when `rhs` is zero
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        let quotient = (i64::from(self.0) << FRACTION_BITS) / i64::from(rhs.0);
        Some(Self(quotient as i32))
    }

    /// Absolute value
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// Square root, zero for non-positive input
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        Self(isqrt((self.0 as u64) << FRACTION_BITS) as i32)
    }

    /// Linear interpolation from `self` to `other`
    ///
    /// A weight of exactly zero returns `self` and exactly one returns
    /// `other`, bit for bit.
    pub fn lerp(self, other: Self, t: Self) -> Self {
        if t.0 == 0 {
            return self;
        }
        if t == Self::ONE {
            return other;
        }
        let delta = i64::from(other.0) - i64::from(self.0);
        let step = (delta * i64::from(t.0)) >> FRACTION_BITS;
        Self((i64::from(self.0) + step) as i32)
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(((i64::from(self.0) * i64::from(rhs.0)) >> FRACTION_BITS) as i32)
    }
}

impl From<i32> for Fixed {
    fn from(value: i32) -> Self {
        Self::from_int(value)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f32())
    }
}

/// Integer square root of a 64-bit value
pub fn isqrt(value: u64) -> u64 {
    value.isqrt()
}

/// Binary angle: 65536 units per full turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle(u16);

// pi in 4.28 fixed point
const PI_Q28: i64 = 843_314_857;
const ONE_Q28: i64 = 1 << 28;

impl Angle {
    /// No rotation
    pub const ZERO: Self = Self(0);
    /// 90 degrees
    pub const QUARTER: Self = Self(0x4000);
    /// 180 degrees
    pub const HALF: Self = Self(0x8000);

    /// Wrap a raw binary angle
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The raw binary angle
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Whole degrees, wrapped into one turn
    pub const fn from_degrees_int(degrees: i32) -> Self {
        let units = (degrees as i64 * 65536 / 360).rem_euclid(65536);
        Self(units as u16)
    }

    /// Degrees from floating point, wrapped into one turn
    pub fn from_degrees(degrees: f32) -> Self {
        let units = (f64::from(degrees) / 360.0 * 65536.0).round() as i64;
        Self(units.rem_euclid(65536) as u16)
    }

    /// Degrees in `[0, 360)`
    pub fn to_degrees(self) -> f32 {
        f32::from(self.0) * 360.0 / 65536.0
    }

    /// Signed distance to `other` along the shorter arc
    pub const fn delta(self, other: Self) -> i16 {
        other.0.wrapping_sub(self.0) as i16
    }

    /// Half of this angle, in `[0, 180)` degrees
    pub const fn half(self) -> Self {
        Self(self.0 >> 1)
    }

    /// Interpolate toward `other` along the shorter arc
    pub fn lerp_shortest(self, other: Self, t: Fixed) -> Self {
        if t.raw() == 0 {
            return self;
        }
        if t == Fixed::ONE {
            return other;
        }
        let delta = i64::from(self.delta(other));
        let step = (delta * i64::from(t.raw())) >> FRACTION_BITS;
        Self(self.0.wrapping_add(step as i16 as u16))
    }

    /// Sine, accurate to within one 20.12 step
    pub fn sin(self) -> Fixed {
        // Fold into [-pi/2, pi/2] where the series converges quickly
        let mut a = i32::from(self.0 as i16);
        if a > 0x4000 {
            a = 0x8000 - a;
        } else if a < -0x4000 {
            a = -0x8000 - a;
        }

        let x = (i64::from(a) * PI_Q28) >> 15;
        let x2 = (x * x) >> 28;
        let mut t = ONE_Q28 - x2 / 72;
        t = ONE_Q28 - ((x2 * t) >> 28) / 42;
        t = ONE_Q28 - ((x2 * t) >> 28) / 20;
        t = ONE_Q28 - ((x2 * t) >> 28) / 6;
        let s = (x * t) >> 28;

        Fixed::from_raw(((s + (1 << 15)) >> 16) as i32)
    }

    /// Cosine
    pub fn cos(self) -> Fixed {
        (self + Self::QUARTER).sin()
    }

    /// Sine and cosine together
    pub fn sin_cos(self) -> (Fixed, Fixed) {
        (self.sin(), self.cos())
    }
}

impl Add for Angle {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Angle {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(Fixed::ONE.raw(), 4096);
        assert_eq!(Fixed::HALF.raw(), 2048);
        assert_eq!(Fixed::from_int(3).raw(), 3 * 4096);
    }

    #[test]
    fn test_floor_and_fract() {
        let f = Fixed::from_raw(4096 * 5 + 100);
        assert_eq!(f.floor(), 5);
        assert_eq!(f.fract().raw(), 100);

        // Negative values floor toward negative infinity
        let f = Fixed::from_raw(-1);
        assert_eq!(f.floor(), -1);
        assert_eq!(f.fract().raw(), 4095);
    }

    #[test]
    fn test_mul() {
        let a = Fixed::from_f32(1.5);
        let b = Fixed::from_f32(-2.0);
        assert_eq!((a * b).raw(), Fixed::from_f32(-3.0).raw());
        assert_eq!(a * Fixed::ONE, a);
    }

    #[test]
    fn test_checked_div() {
        let a = Fixed::from_int(3);
        let b = Fixed::from_int(2);
        assert_eq!(a.checked_div(b), Some(Fixed::from_f32(1.5)));
        assert_eq!(a.checked_div(Fixed::ZERO), None);
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Fixed::from_int(4).sqrt(), Fixed::from_int(2));
        assert_eq!(Fixed::ONE.sqrt(), Fixed::ONE);
        assert_eq!(Fixed::from_int(-4).sqrt(), Fixed::ZERO);
    }

    #[test]
    fn test_lerp_endpoints_are_exact() {
        let a = Fixed::from_raw(1234);
        let b = Fixed::from_raw(-98765);
        assert_eq!(a.lerp(b, Fixed::ZERO), a);
        assert_eq!(a.lerp(b, Fixed::ONE), b);
        assert_eq!(
            Fixed::ZERO.lerp(Fixed::from_int(10), Fixed::HALF),
            Fixed::from_int(5)
        );
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(Fixed::from_int(2).clamp_unit(), Fixed::ONE);
        assert_eq!(Fixed::from_int(-1).clamp_unit(), Fixed::ZERO);
        assert_eq!(Fixed::HALF.clamp_unit(), Fixed::HALF);
    }

    #[test]
    fn test_angle_degrees() {
        assert_eq!(Angle::from_degrees_int(90), Angle::QUARTER);
        assert_eq!(Angle::from_degrees_int(180), Angle::HALF);
        assert_eq!(Angle::from_degrees_int(-90).raw(), 0xC000);
        assert_eq!(Angle::from_degrees_int(450), Angle::QUARTER);
        assert!((Angle::from_degrees(45.0).to_degrees() - 45.0).abs() < 0.01);
    }

    #[test]
    fn test_angle_shortest_path_across_zero() {
        let a = Angle::from_degrees(350.0);
        let b = Angle::from_degrees(10.0);
        let mid = a.lerp_shortest(b, Fixed::HALF);
        // 0 and 360 are the same binary angle
        assert!(mid.raw() <= 2 || mid.raw() >= 65534, "got {}", mid.raw());

        let back = b.lerp_shortest(a, Fixed::HALF);
        assert!(back.raw() <= 2 || back.raw() >= 65534, "got {}", back.raw());
    }

    #[test_case(0, 0, 4096 ; "zero")]
    #[test_case(90, 4096, 0 ; "quarter")]
    #[test_case(180, 0, -4096 ; "half")]
    #[test_case(270, -4096, 0 ; "three quarters")]
    fn test_sin_cos_cardinal(degrees: i32, sin: i32, cos: i32) {
        let (s, c) = Angle::from_degrees_int(degrees).sin_cos();
        assert_eq!(s.raw(), sin);
        assert_eq!(c.raw(), cos);
    }

    #[test]
    fn test_sin_accuracy() {
        for raw in (0..=u16::MAX).step_by(97) {
            let angle = Angle::from_raw(raw);
            let expected = (f64::from(raw) / 65536.0 * std::f64::consts::TAU).sin();
            let actual = f64::from(angle.sin().to_f32());
            assert!(
                (expected - actual).abs() <= 1.5 / 4096.0,
                "sin({raw}) = {actual}, expected {expected}"
            );
        }
    }
}
