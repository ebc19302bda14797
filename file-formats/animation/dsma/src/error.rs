use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which kind of asset a decode error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Static model and skeleton (`.dsm`)
    Model,
    /// Animation clip (`.dsa`)
    Animation,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "DSM model"),
            Self::Animation => write!(f, "DSA animation"),
        }
    }
}

/// The invariant a malformed asset violated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// Magic bytes at the start of the file did not match
    #[error("invalid magic: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// File version is not understood by this decoder
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    /// A read ran past the end of the buffer
    #[error("truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Data remained after the last declared record
    #[error("{0} trailing bytes after the last record")]
    TrailingBytes(usize),

    /// Declared counts describe more data than can possibly exist
    #[error("declared {count} {what} overflow the addressable size")]
    CountOverflow { what: &'static str, count: u32 },

    /// Skeleton declares no bones
    #[error("skeleton has no bones")]
    EmptySkeleton,

    /// Animation declares no frames
    #[error("animation has no frames")]
    EmptyClip,

    /// Bone 0 must be a root so composition can start from the placement
    #[error("bone 0 has parent {0}, the first bone must be a root")]
    FirstBoneNotRoot(i32),

    /// Parent indices must point to an earlier bone
    #[error("bone {bone} has parent {parent}, parents must precede their children")]
    ParentOutOfOrder { bone: u32, parent: i32 },

    /// Frame count too large to address with a 20.12 frame position
    #[error("animation has {0} frames, at most {max} are supported", max = crate::anim::MAX_FRAME_COUNT)]
    TooManyFrames(u32),

    /// Skeleton larger than a bone index can address
    #[error("skeleton has {0} bones, at most {max} are supported", max = crate::model::MAX_BONE_COUNT)]
    TooManyBones(u32),

    /// A bone track does not hold one keyframe per frame
    #[error("track for bone {bone} has {actual} keyframes, expected {expected}")]
    TrackLengthMismatch {
        bone: u32,
        expected: u32,
        actual: usize,
    },

    /// Submesh bound to a bone that does not exist
    #[error("submesh {submesh} is bound to bone {bone}, skeleton has {bone_count} bones")]
    BoneIndexOutOfRange {
        submesh: u32,
        bone: u32,
        bone_count: u32,
    },

    /// Command id not known to the geometry engine
    #[error("unknown geometry command 0x{command:02X} at word {word}")]
    UnknownCommand { command: u8, word: usize },

    /// Command whose parameters run past the end of the block
    #[error("geometry command 0x{command:02X} at word {word} needs {needed} parameters")]
    TruncatedCommand {
        command: u8,
        word: usize,
        needed: usize,
    },

    /// Command that would escape the per-bone matrix scope
    #[error("geometry command 0x{command:02X} at word {word} is not allowed inside a submesh")]
    ForbiddenCommand { command: u8, word: usize },
}

/// Error types for DSM/DSA loading and evaluation
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Asset bytes violate the format
    #[error("Malformed {asset}: {reason}")]
    Malformed {
        asset: AssetKind,
        reason: MalformedReason,
    },

    /// Clip does not fit the skeleton it is evaluated against
    #[error("Incompatible animation: clip has {clip_bones} bones, skeleton has {skeleton_bones}")]
    Incompatible { clip_bones: u32, skeleton_bones: u32 },

    /// Asset file could not be read
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DecodeError {
    pub(crate) fn malformed(asset: AssetKind, reason: MalformedReason) -> Self {
        Self::Malformed { asset, reason }
    }

    /// The violated invariant, if this is a malformed-asset error
    pub fn reason(&self) -> Option<&MalformedReason> {
        match self {
            Self::Malformed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Result type using DecodeError
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = DecodeError::malformed(
            AssetKind::Model,
            MalformedReason::ParentOutOfOrder { bone: 3, parent: 5 },
        );
        assert_eq!(
            error.to_string(),
            "Malformed DSM model: bone 3 has parent 5, parents must precede their children"
        );

        let error = DecodeError::Incompatible {
            clip_bones: 4,
            skeleton_bones: 7,
        };
        assert_eq!(
            error.to_string(),
            "Incompatible animation: clip has 4 bones, skeleton has 7"
        );
    }

    #[test]
    fn test_reason_accessor() {
        let error = DecodeError::malformed(AssetKind::Animation, MalformedReason::EmptyClip);
        assert_eq!(error.reason(), Some(&MalformedReason::EmptyClip));

        let error = DecodeError::Incompatible {
            clip_bones: 1,
            skeleton_bones: 2,
        };
        assert!(error.reason().is_none());
    }
}
