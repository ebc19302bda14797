//! Keyframe sampling at fractional frame positions

use super::types::Lerp;
use crate::fixed::Fixed;

/// A fractional frame position resolved against a clip length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSample {
    /// Keyframe at or before the position
    pub current: usize,
    /// Keyframe after `current`, wrapping to the first frame
    pub next: usize,
    /// Weight of `next`, in `[0, 1)`
    pub weight: Fixed,
}

/// Split a frame position into the bracketing keyframes and a weight
///
/// Positions outside `[0, frame_count)` wrap in both directions, so
/// `frame` and `frame + frame_count` resolve identically. A single-frame
/// clip always resolves to its only keyframe with no interpolation.
pub fn split_frame(frame: Fixed, frame_count: u32) -> FrameSample {
    if frame_count <= 1 {
        return FrameSample {
            current: 0,
            next: 0,
            weight: Fixed::ZERO,
        };
    }

    let count = i64::from(frame_count);
    let current = i64::from(frame.floor()).rem_euclid(count);
    let next = (current + 1) % count;

    FrameSample {
        current: current as usize,
        next: next as usize,
        weight: frame.fract(),
    }
}

/// Interpolate a track at a resolved position
///
/// Returns `None` only if the track is shorter than the clip the sample
/// was resolved against.
pub fn interpolate_track<T: Lerp>(track: &[T], sample: FrameSample) -> Option<T> {
    let current = track.get(sample.current)?;

    // Integer frames reproduce the stored keyframe exactly
    if sample.weight == Fixed::ZERO {
        return Some(current.clone());
    }

    let next = track.get(sample.next)?;
    Some(current.lerp(next, sample.weight))
}

/// Interpolate two tracks and blend the results
///
/// `blend` is clamped to `[0, 1]`; zero yields the first track only and one
/// the second, without touching the other.
pub fn interpolate_with_blend<T: Lerp>(
    first: &[T],
    first_sample: FrameSample,
    second: &[T],
    second_sample: FrameSample,
    blend: Fixed,
) -> Option<T> {
    let blend = blend.clamp_unit();

    if blend == Fixed::ZERO {
        return interpolate_track(first, first_sample);
    }
    if blend == Fixed::ONE {
        return interpolate_track(second, second_sample);
    }

    let a = interpolate_track(first, first_sample)?;
    let b = interpolate_track(second, second_sample)?;
    Some(a.lerp(&b, blend))
}
