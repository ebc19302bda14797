//! Common types for the animation system

use crate::fixed::{Angle, FRACTION_BITS, Fixed};

/// Trait for types that can be interpolated with a fixed-point weight
pub trait Lerp: Clone {
    /// Interpolate between self and other
    ///
    /// Implementations return `self` unchanged for a weight of zero and
    /// `other` unchanged for a weight of one.
    fn lerp(&self, other: &Self, t: Fixed) -> Self;
}

impl Lerp for Fixed {
    fn lerp(&self, other: &Self, t: Fixed) -> Self {
        Self::lerp(*self, *other, t)
    }
}

/// 3D vector for positions and scales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl Vec3 {
    /// Zero vector
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO);

    /// Unit scale vector
    pub const ONE: Self = Self::new(Fixed::ONE, Fixed::ONE, Fixed::ONE);

    /// Unit X axis
    pub const X: Self = Self::new(Fixed::ONE, Fixed::ZERO, Fixed::ZERO);

    /// Unit Y axis
    pub const Y: Self = Self::new(Fixed::ZERO, Fixed::ONE, Fixed::ZERO);

    /// Unit Z axis
    pub const Z: Self = Self::new(Fixed::ZERO, Fixed::ZERO, Fixed::ONE);

    /// Create a new vector
    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Create a vector from floating point components
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self::new(Fixed::from_f32(x), Fixed::from_f32(y), Fixed::from_f32(z))
    }

    /// Scale every component
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor, self.z * factor)
    }

    /// Convert to glam for tooling
    pub fn to_glam(self) -> glam::Vec3 {
        glam::Vec3::new(self.x.to_f32(), self.y.to_f32(), self.z.to_f32())
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: Fixed) -> Self {
        Self {
            x: self.x.lerp(other.x, t),
            y: self.y.lerp(other.y, t),
            z: self.z.lerp(other.z, t),
        }
    }
}

/// Quaternion representation for rotations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quat {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub w: Fixed,
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self::new(Fixed::ZERO, Fixed::ZERO, Fixed::ZERO, Fixed::ONE);

    /// Create a new quaternion
    pub const fn new(x: Fixed, y: Fixed, z: Fixed, w: Fixed) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` around a unit `axis`
    pub fn from_axis_angle(axis: Vec3, angle: Angle) -> Self {
        let (sin, cos) = angle.half().sin_cos();
        Self::new(axis.x * sin, axis.y * sin, axis.z * sin, cos)
    }

    /// Rotation around the X axis
    pub fn from_rotation_x(angle: Angle) -> Self {
        Self::from_axis_angle(Vec3::X, angle)
    }

    /// Rotation around the Y axis
    pub fn from_rotation_y(angle: Angle) -> Self {
        Self::from_axis_angle(Vec3::Y, angle)
    }

    /// Rotation around the Z axis
    pub fn from_rotation_z(angle: Angle) -> Self {
        Self::from_axis_angle(Vec3::Z, angle)
    }

    // Four-dimensional dot product in 40.24, wide enough for any component
    fn dot_raw(&self, other: &Self) -> i128 {
        i128::from(self.x.raw()) * i128::from(other.x.raw())
            + i128::from(self.y.raw()) * i128::from(other.y.raw())
            + i128::from(self.z.raw()) * i128::from(other.z.raw())
            + i128::from(self.w.raw()) * i128::from(other.w.raw())
    }

    /// Four-dimensional dot product
    pub fn dot(&self, other: &Self) -> Fixed {
        Fixed::from_raw((self.dot_raw(other) >> FRACTION_BITS) as i32)
    }

    /// Normalize the quaternion
    pub fn normalize(&self) -> Self {
        let length = (self.dot_raw(self) as u128).isqrt() as i64;
        if length == 0 {
            return Self::IDENTITY;
        }
        // |c| <= length, so every quotient fits in [-ONE, ONE]
        let scale = |c: Fixed| Fixed::from_raw(((i64::from(c.raw()) << FRACTION_BITS) / length) as i32);
        Self::new(scale(self.x), scale(self.y), scale(self.z), scale(self.w))
    }

    /// Normalized linear interpolation along the shorter arc
    pub fn nlerp(&self, other: &Self, t: Fixed) -> Self {
        if t.raw() == 0 {
            return *self;
        }
        if t == Fixed::ONE {
            return *other;
        }

        // q and -q are the same rotation, pick the one in our hemisphere
        let other = if self.dot_raw(other) < 0 {
            -*other
        } else {
            *other
        };

        Self::new(
            self.x.lerp(other.x, t),
            self.y.lerp(other.y, t),
            self.z.lerp(other.z, t),
            self.w.lerp(other.w, t),
        )
        .normalize()
    }

    /// Convert to glam for tooling
    pub fn to_glam(self) -> glam::Quat {
        glam::Quat::from_xyzw(
            self.x.to_f32(),
            self.y.to_f32(),
            self.z.to_f32(),
            self.w.to_f32(),
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Neg for Quat {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl Lerp for Quat {
    fn lerp(&self, other: &Self, t: Fixed) -> Self {
        self.nlerp(other, t)
    }
}

/// Local bone transform: translation, rotation and scale
///
/// This is both the bind pose stored in a model and the keyframe sample
/// stored in an animation clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// A sampled transform for one bone at one frame
pub type Keyframe = Transform;

impl Transform {
    /// No translation, no rotation, unit scale
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Pure translation
    pub const fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY, Vec3::ONE)
    }

    /// Translation followed by a rotation
    pub const fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self::new(translation, rotation, Vec3::ONE)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Lerp for Transform {
    fn lerp(&self, other: &Self, t: Fixed) -> Self {
        Self {
            translation: self.translation.lerp(&other.translation, t),
            rotation: self.rotation.nlerp(&other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}
