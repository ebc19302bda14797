//! Fixed-point affine matrices for bone transforms
//!
//! The geometry engine consumes 4x3 matrices: a 3x3 linear part followed by
//! a translation row. [`Mat4x3`] stores them column-major in exactly the order
//! `MTX_MULT_4x3` expects, so a bone matrix can be uploaded without shuffling.

use super::types::{Quat, Transform, Vec3};
use crate::fixed::{FRACTION_BITS, Fixed};

/// 4x3 affine transformation matrix (column-major)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat4x3 {
    /// Three basis columns followed by the translation
    pub data: [Fixed; 12],
}

const O: Fixed = Fixed::ZERO;
const I: Fixed = Fixed::ONE;

impl Mat4x3 {
    /// Identity matrix
    pub const IDENTITY: Self = Self {
        data: [
            I, O, O, // Column 0
            O, I, O, // Column 1
            O, O, I, // Column 2
            O, O, O, // Translation
        ],
    };

    /// Create translation matrix
    pub fn from_translation(v: Vec3) -> Self {
        Self {
            data: [I, O, O, O, I, O, O, O, I, v.x, v.y, v.z],
        }
    }

    /// Create scale matrix
    pub fn from_scale(v: Vec3) -> Self {
        Self {
            data: [v.x, O, O, O, v.y, O, O, O, v.z, O, O, O],
        }
    }

    /// Create rotation matrix from quaternion
    pub fn from_rotation(q: Quat) -> Self {
        Self::from_transform(&Transform::from_translation_rotation(Vec3::ZERO, q))
    }

    /// Translation * Rotation * Scale
    pub fn from_transform(transform: &Transform) -> Self {
        let Quat { x, y, z, w } = transform.rotation;

        let x2 = x + x;
        let y2 = y + y;
        let z2 = z + z;

        let xx = x * x2;
        let xy = x * y2;
        let xz = x * z2;
        let yy = y * y2;
        let yz = y * z2;
        let zz = z * z2;
        let wx = w * x2;
        let wy = w * y2;
        let wz = w * z2;

        let Vec3 {
            x: sx,
            y: sy,
            z: sz,
        } = transform.scale;
        let t = transform.translation;

        Self {
            data: [
                (I - (yy + zz)) * sx,
                (xy + wz) * sx,
                (xz - wy) * sx,
                (xy - wz) * sy,
                (I - (xx + zz)) * sy,
                (yz + wx) * sy,
                (xz + wy) * sz,
                (yz - wx) * sz,
                (I - (xx + yy)) * sz,
                t.x,
                t.y,
                t.z,
            ],
        }
    }

    /// Column `index` of the linear part, or the translation for index 3
    pub fn column(&self, index: usize) -> Vec3 {
        let base = index * 3;
        Vec3::new(self.data[base], self.data[base + 1], self.data[base + 2])
    }

    /// Translation part
    pub fn translation(&self) -> Vec3 {
        self.column(3)
    }

    // Dot product of row `row` of the linear part with a vector, single rounding
    fn row_dot(&self, row: usize, x: Fixed, y: Fixed, z: Fixed) -> i128 {
        i128::from(self.data[row].raw()) * i128::from(x.raw())
            + i128::from(self.data[3 + row].raw()) * i128::from(y.raw())
            + i128::from(self.data[6 + row].raw()) * i128::from(z.raw())
    }

    // Out of range results wrap like the geometry engine's 32-bit registers
    fn narrow(value: i128) -> Fixed {
        Fixed::from_raw((value >> FRACTION_BITS) as i32)
    }

    /// Multiply two matrices (self * other)
    pub fn mul(&self, other: &Self) -> Self {
        let mut data = [Fixed::ZERO; 12];

        for column in 0..3 {
            let c = other.column(column);
            for row in 0..3 {
                data[column * 3 + row] = Self::narrow(self.row_dot(row, c.x, c.y, c.z));
            }
        }

        let t = other.translation();
        for row in 0..3 {
            data[9 + row] = Self::narrow(self.row_dot(row, t.x, t.y, t.z)) + self.data[9 + row];
        }

        Self { data }
    }

    /// Transform a point by this matrix
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            Self::narrow(self.row_dot(0, p.x, p.y, p.z)) + self.data[9],
            Self::narrow(self.row_dot(1, p.x, p.y, p.z)) + self.data[10],
            Self::narrow(self.row_dot(2, p.x, p.y, p.z)) + self.data[11],
        )
    }

    /// Transform a direction by this matrix (ignores translation)
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            Self::narrow(self.row_dot(0, v.x, v.y, v.z)),
            Self::narrow(self.row_dot(1, v.x, v.y, v.z)),
            Self::narrow(self.row_dot(2, v.x, v.y, v.z)),
        )
    }

    /// Get matrix as flat array
    pub fn as_array(&self) -> &[Fixed; 12] {
        &self.data
    }

    /// Raw 20.12 words in upload order
    pub fn to_raw(&self) -> [i32; 12] {
        self.data.map(Fixed::raw)
    }

    /// Convert to a floating point matrix for tooling
    pub fn to_mat4(&self) -> glam::Mat4 {
        glam::Mat4::from_cols(
            self.column(0).to_glam().extend(0.0),
            self.column(1).to_glam().extend(0.0),
            self.column(2).to_glam().extend(0.0),
            self.translation().to_glam().extend(1.0),
        )
    }
}

impl Default for Mat4x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl std::ops::Mul for Mat4x3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::mul(&self, &rhs)
    }
}
