//! Bounds-checked little-endian reading and writing of asset records

use std::io::{self, Cursor, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::animation::{Quat, Transform, Vec3};
use crate::error::{AssetKind, DecodeError, MalformedReason, Result};
use crate::fixed::Fixed;

/// Size of a serialized [`Transform`]: translation, rotation and scale words
pub const TRANSFORM_SIZE: usize = 40;

/// Reader over an in-memory asset that reports every overrun as malformed
pub(crate) struct SliceReader<'a> {
    cursor: Cursor<&'a [u8]>,
    asset: AssetKind,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8], asset: AssetKind) -> Self {
        Self {
            cursor: Cursor::new(data),
            asset,
        }
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.cursor.get_ref().len().saturating_sub(self.position())
    }

    pub fn malformed(&self, reason: MalformedReason) -> DecodeError {
        DecodeError::malformed(self.asset, reason)
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        self.malformed(MalformedReason::Truncated {
            offset: self.position(),
            needed,
            available: self.remaining(),
        })
    }

    pub fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(self.truncated(needed));
        }
        Ok(())
    }

    /// Check that `count` records of `record_size` bytes fit in what is left
    ///
    /// Runs before any allocation sized by `count`, so a corrupt header can
    /// never request more memory than the buffer itself occupies.
    pub fn ensure_records(&self, what: &'static str, count: u32, record_size: usize) -> Result<()> {
        let needed = (count as usize)
            .checked_mul(record_size)
            .ok_or_else(|| self.malformed(MalformedReason::CountOverflow { what, count }))?;
        self.ensure(needed)
    }

    pub fn read_magic(&mut self, expected: [u8; 4]) -> Result<()> {
        self.ensure(4)?;
        let mut magic = [0u8; 4];
        for byte in &mut magic {
            *byte = self.read_u8()?;
        }
        if magic != expected {
            return Err(self.malformed(MalformedReason::InvalidMagic {
                expected: String::from_utf8_lossy(&expected).to_string(),
                actual: String::from_utf8_lossy(&magic).to_string(),
            }));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        match self.cursor.read_u8() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.truncated(1)),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        match self.cursor.read_u32::<LittleEndian>() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.truncated(4)),
        }
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        match self.cursor.read_i32::<LittleEndian>() {
            Ok(value) => Ok(value),
            Err(_) => Err(self.truncated(4)),
        }
    }

    pub fn read_u32_array(&mut self, count: u32) -> Result<Vec<u32>> {
        self.ensure_records("words", count, 4)?;
        let mut words = Vec::with_capacity(count as usize);
        for _ in 0..count {
            words.push(self.read_u32()?);
        }
        Ok(words)
    }

    pub fn read_fixed(&mut self) -> Result<Fixed> {
        Ok(Fixed::from_raw(self.read_i32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(
            self.read_fixed()?,
            self.read_fixed()?,
            self.read_fixed()?,
        ))
    }

    pub fn read_quat(&mut self) -> Result<Quat> {
        Ok(Quat::new(
            self.read_fixed()?,
            self.read_fixed()?,
            self.read_fixed()?,
            self.read_fixed()?,
        ))
    }

    pub fn read_transform(&mut self) -> Result<Transform> {
        Ok(Transform::new(
            self.read_vec3()?,
            self.read_quat()?,
            self.read_vec3()?,
        ))
    }

    /// Fail if anything is left after the last record
    pub fn expect_end(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(self.malformed(MalformedReason::TrailingBytes(n))),
        }
    }
}

/// Writing counterpart of [`SliceReader`]
pub(crate) trait WriteExt: Write {
    fn write_fixed(&mut self, value: Fixed) -> io::Result<()> {
        self.write_i32::<LittleEndian>(value.raw())
    }

    fn write_vec3(&mut self, v: &Vec3) -> io::Result<()> {
        self.write_fixed(v.x)?;
        self.write_fixed(v.y)?;
        self.write_fixed(v.z)
    }

    fn write_quat(&mut self, q: &Quat) -> io::Result<()> {
        self.write_fixed(q.x)?;
        self.write_fixed(q.y)?;
        self.write_fixed(q.z)?;
        self.write_fixed(q.w)
    }

    fn write_transform(&mut self, t: &Transform) -> io::Result<()> {
        self.write_vec3(&t.translation)?;
        self.write_quat(&t.rotation)?;
        self.write_vec3(&t.scale)
    }
}

impl<W: Write + ?Sized> WriteExt for W {}
