//! Playback state owned by the caller

use crate::anim::{AnimationClip, MAX_FRAME_COUNT};
use crate::fixed::{FRACTION_BITS, Fixed};

/// Playback position within one clip
///
/// The frame position always stays in `[0, frame_count)`: every update
/// wraps, forward or backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationState {
    frame: Fixed,
    frame_count: u32,
    speed: Fixed,
}

impl AnimationState {
    /// Start at frame zero, advancing one frame per tick
    pub fn new(frame_count: u32) -> Self {
        Self {
            frame: Fixed::ZERO,
            frame_count: frame_count.min(MAX_FRAME_COUNT),
            speed: Fixed::ONE,
        }
    }

    /// Playback state for `clip`
    pub fn for_clip(clip: &AnimationClip) -> Self {
        Self::new(clip.frame_count())
    }

    /// Frames advanced per [`advance`](Self::advance) call
    pub fn with_speed(mut self, speed: Fixed) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_frame(mut self, frame: Fixed) -> Self {
        self.set_frame(frame);
        self
    }

    pub fn frame(&self) -> Fixed {
        self.frame
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn speed(&self) -> Fixed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: Fixed) {
        self.speed = speed;
    }

    /// Jump to `frame`, wrapped into the clip
    pub fn set_frame(&mut self, frame: Fixed) {
        self.frame = Fixed::ZERO;
        self.step(frame);
    }

    /// Move forward by the configured speed
    pub fn advance(&mut self) {
        self.step(self.speed);
    }

    /// Move by a signed number of frames
    pub fn step(&mut self, delta: Fixed) {
        if self.frame_count == 0 {
            self.frame = Fixed::ZERO;
            return;
        }
        let span = i64::from(self.frame_count) << FRACTION_BITS;
        let raw = (i64::from(self.frame.raw()) + i64::from(delta.raw())).rem_euclid(span);
        self.frame = Fixed::from_raw(raw as i32);
    }
}

/// Two playback states and the weight of the second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendState {
    pub first: AnimationState,
    pub second: AnimationState,
    blend: Fixed,
}

impl BlendState {
    /// Blend starting fully on `first`
    pub fn new(first: AnimationState, second: AnimationState) -> Self {
        Self {
            first,
            second,
            blend: Fixed::ZERO,
        }
    }

    pub fn with_blend(mut self, blend: Fixed) -> Self {
        self.set_blend(blend);
        self
    }

    /// Weight of `second`, always in `[0, 1]`
    pub fn blend(&self) -> Fixed {
        self.blend
    }

    pub fn set_blend(&mut self, blend: Fixed) {
        self.blend = blend.clamp_unit();
    }

    /// Shift the weight by `delta`, saturating at either end
    pub fn nudge_blend(&mut self, delta: Fixed) {
        let raw = i64::from(self.blend.raw()) + i64::from(delta.raw());
        self.blend = Fixed::from_raw(raw.clamp(0, i64::from(Fixed::ONE.raw())) as i32);
    }

    /// Advance both states by their own speeds
    pub fn advance(&mut self) {
        self.first.advance();
        self.second.advance();
    }
}
