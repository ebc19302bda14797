use std::io::{self, Write};
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::animation::{Keyframe, Transform};
use crate::error::{AssetKind, DecodeError, MalformedReason, Result};
use crate::fixed::FRACTION_BITS;
use crate::io_ext::{SliceReader, TRANSFORM_SIZE, WriteExt};
use crate::model::MAX_BONE_COUNT;

/// Magic signature for DSA files
pub const DSA_MAGIC: [u8; 4] = *b"DSAF";

/// The only DSA version this decoder understands
pub const DSA_VERSION: u32 = 1;

/// Size of a serialized keyframe
pub const KEYFRAME_SIZE: usize = TRANSFORM_SIZE;

/// Largest frame count whose positions fit a 20.12 frame value
pub const MAX_FRAME_COUNT: u32 = (i32::MAX >> FRACTION_BITS) as u32;

/// Sampled animation: one keyframe per bone per frame
///
/// Keyframes are stored bone-major, so the track of a single bone is a
/// contiguous slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationClip {
    frame_count: u32,
    bone_count: u32,
    keyframes: Vec<Keyframe>,
}

impl AnimationClip {
    /// Build a clip from per-bone tracks of `frame_count` keyframes each
    pub fn new(frame_count: u32, tracks: Vec<Vec<Keyframe>>) -> Result<Self> {
        let malformed = |reason| DecodeError::malformed(AssetKind::Animation, reason);

        Self::check_counts(frame_count, tracks.len() as u32).map_err(malformed)?;

        let mut keyframes = Vec::with_capacity(frame_count as usize * tracks.len());
        for (bone, track) in tracks.iter().enumerate() {
            if track.len() != frame_count as usize {
                return Err(malformed(MalformedReason::TrackLengthMismatch {
                    bone: bone as u32,
                    expected: frame_count,
                    actual: track.len(),
                }));
            }
            keyframes.extend_from_slice(track);
        }

        Ok(Self {
            frame_count,
            bone_count: tracks.len() as u32,
            keyframes,
        })
    }

    fn check_counts(frame_count: u32, bone_count: u32) -> std::result::Result<(), MalformedReason> {
        if frame_count == 0 {
            return Err(MalformedReason::EmptyClip);
        }
        if frame_count > MAX_FRAME_COUNT {
            return Err(MalformedReason::TooManyFrames(frame_count));
        }
        if bone_count == 0 {
            return Err(MalformedReason::EmptySkeleton);
        }
        if bone_count > MAX_BONE_COUNT {
            return Err(MalformedReason::TooManyBones(bone_count));
        }
        Ok(())
    }

    /// Decode a DSA asset from memory
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(data, AssetKind::Animation);

        reader.read_magic(DSA_MAGIC)?;
        let version = reader.read_u32()?;
        if version != DSA_VERSION {
            return Err(reader.malformed(MalformedReason::UnsupportedVersion(version)));
        }

        let frame_count = reader.read_u32()?;
        let bone_count = reader.read_u32()?;
        Self::check_counts(frame_count, bone_count).map_err(|reason| reader.malformed(reason))?;

        let total = frame_count.checked_mul(bone_count).ok_or_else(|| {
            reader.malformed(MalformedReason::CountOverflow {
                what: "keyframes",
                count: frame_count,
            })
        })?;
        reader.ensure_records("keyframes", total, KEYFRAME_SIZE)?;

        let mut keyframes = Vec::with_capacity(total as usize);
        for _ in 0..total {
            keyframes.push(reader.read_transform()?);
        }
        reader.expect_end()?;

        debug!(
            "Loaded DSA animation: {} frames, {} bones, {} bytes",
            frame_count,
            bone_count,
            data.len()
        );

        Ok(Self {
            frame_count,
            bone_count,
            keyframes,
        })
    }

    /// Read and decode a DSA file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&data)
    }

    /// Encode in the layout [`load`](Self::load) reads
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&DSA_MAGIC)?;
        writer.write_u32::<LittleEndian>(DSA_VERSION)?;
        writer.write_u32::<LittleEndian>(self.frame_count)?;
        writer.write_u32::<LittleEndian>(self.bone_count)?;
        for keyframe in &self.keyframes {
            writer.write_transform(keyframe)?;
        }
        Ok(())
    }

    /// Encode into a new buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 + self.keyframes.len() * KEYFRAME_SIZE);
        // Writing into a Vec cannot fail
        let _ = self.write(&mut out);
        out
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn bone_count(&self) -> u32 {
        self.bone_count
    }

    /// Sample of `bone` at integer `frame`
    pub fn keyframe(&self, bone: usize, frame: usize) -> Option<&Transform> {
        if frame >= self.frame_count as usize {
            return None;
        }
        self.track(bone)?.get(frame)
    }

    /// All keyframes of one bone, in frame order
    pub fn track(&self, bone: usize) -> Option<&[Transform]> {
        let len = self.frame_count as usize;
        let start = bone.checked_mul(len)?;
        self.keyframes.get(start..start + len)
    }

    /// Iterate over the tracks in bone order
    pub fn tracks(&self) -> impl ExactSizeIterator<Item = &[Transform]> + '_ {
        self.keyframes.chunks_exact(self.frame_count as usize)
    }
}

/// Number of frames in a clip
pub fn get_frame_count(clip: &AnimationClip) -> u32 {
    clip.frame_count()
}
