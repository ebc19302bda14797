//! Fixed-point skeletal animation for rigid-skinned models
//!
//! A model (`.dsm`) holds a skeleton and geometry bound rigidly to its bones.
//! Animation clips (`.dsa`) hold one sampled local transform per bone per
//! frame. Each frame the caller evaluates a pose at a fractional frame
//! position, optionally blending two clips, and hands the posed model to a
//! [`RenderBackend`](backend::RenderBackend).
//!
//! All evaluation runs on 20.12 fixed-point integers, the native format of
//! FPU-less geometry engines.
//!
//! ```rust,no_run
//! use dsma::animation::{Pose, PoseEvaluator};
//! use dsma::backend::{RecordingBackend, RenderBackend, wait_for_idle};
//! use dsma::{AnimationClip, Fixed, Model, skinning};
//!
//! let model = Model::load_file("robot.dsm")?;
//! let walk = AnimationClip::load_file("robot_walk.dsa")?;
//! let wave = AnimationClip::load_file("robot_wave.dsa")?;
//!
//! let mut pose = Pose::for_model(&model);
//! let mut backend = RecordingBackend::new();
//!
//! PoseEvaluator::default().evaluate_blend_into(
//!     &model,
//!     &walk,
//!     Fixed::from_raw(0x1200),
//!     &wave,
//!     Fixed::from_raw(0x0400),
//!     Fixed::HALF,
//!     &mut pose,
//! )?;
//! skinning::draw(&model, &pose, &mut backend)?;
//!
//! wait_for_idle(&backend, 10_000);
//! println!("{:?}", backend.stats());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod anim;
pub mod animation;
pub mod backend;
pub mod display_list;
pub mod error;
pub mod fixed;
mod io_ext;
pub mod model;
pub mod skinning;

// Re-export common types
pub use anim::{AnimationClip, get_frame_count};
pub use error::{AssetKind, DecodeError, MalformedReason, Result};
pub use fixed::{Angle, Fixed};
pub use model::{Bone, Model, Submesh};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
