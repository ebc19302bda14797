//! Skeletal animation
//!
//! This module turns clips into per-bone world matrices:
//! - Fixed-point vectors, quaternions and local transforms
//! - Keyframe interpolation at fractional frame positions
//! - Local-space blending of two clips
//! - Forward composition of the bone hierarchy into [`Mat4x3`] matrices
//! - Caller-owned playback state
//!
//! # Example
//!
//! ```rust,no_run
//! use dsma::animation::{AnimationState, Pose, PoseEvaluator};
//! use dsma::{AnimationClip, Fixed, Model};
//!
//! # fn main() -> dsma::Result<()> {
//! let model = Model::load_file("robot.dsm")?;
//! let walk = AnimationClip::load_file("robot_walk.dsa")?;
//!
//! let evaluator = PoseEvaluator::default();
//! let mut state = AnimationState::for_clip(&walk).with_speed(Fixed::from_raw(1 << 9));
//! let mut pose = Pose::for_model(&model);
//!
//! loop {
//!     evaluator.evaluate_state_into(&model, &walk, &state, &mut pose)?;
//!     // draw with dsma::skinning::draw(&model, &pose, &mut backend)
//!     state.advance();
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

mod bone_transform;
mod evaluator;
mod interpolation;
mod state;
mod types;

pub use bone_transform::Mat4x3;
pub use evaluator::{Pose, PoseEvaluator, evaluate, evaluate_blend};
pub use interpolation::{FrameSample, interpolate_track, interpolate_with_blend, split_frame};
pub use state::{AnimationState, BlendState};
pub use types::{Keyframe, Lerp, Quat, Transform, Vec3};
