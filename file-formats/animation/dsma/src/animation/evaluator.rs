//! World-space bone matrices from clips
//!
//! Each bone's local transform is sampled from the clip (and optionally
//! blended with a second clip in local space), converted to a [`Mat4x3`]
//! and composed with its parent's world matrix. Parents always precede
//! their children, so a single forward pass over the bones suffices.

use log::trace;

use super::bone_transform::Mat4x3;
use super::interpolation::{interpolate_track, interpolate_with_blend, split_frame};
use super::state::{AnimationState, BlendState};
use super::types::Transform;
use crate::anim::AnimationClip;
use crate::error::{DecodeError, Result};
use crate::fixed::Fixed;
use crate::model::{Bone, Model};

/// World matrix of every bone, indexed like the model's bones
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    world: Vec<Mat4x3>,
}

impl Pose {
    /// Pose buffer for `bone_count` bones, all at identity
    pub fn new(bone_count: usize) -> Self {
        Self {
            world: vec![Mat4x3::IDENTITY; bone_count],
        }
    }

    /// Pose buffer sized for `model`
    pub fn for_model(model: &Model) -> Self {
        Self::new(model.bone_count())
    }

    pub fn world(&self) -> &[Mat4x3] {
        &self.world
    }

    pub fn bone(&self, index: usize) -> Option<&Mat4x3> {
        self.world.get(index)
    }

    pub fn len(&self) -> usize {
        self.world.len()
    }

    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Resize for `bone_count` bones, reusing the allocation
    pub fn reset(&mut self, bone_count: usize) {
        self.world.resize(bone_count, Mat4x3::IDENTITY);
    }
}

/// Evaluates poses for models placed in the scene
///
/// Root bones are composed with the placement matrix, so the same model can
/// be drawn at several positions without touching its skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseEvaluator {
    placement: Mat4x3,
}

impl Default for PoseEvaluator {
    fn default() -> Self {
        Self {
            placement: Mat4x3::IDENTITY,
        }
    }
}

impl PoseEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `placement` as the parent of every root bone
    pub fn with_placement(mut self, placement: Mat4x3) -> Self {
        self.placement = placement;
        self
    }

    pub fn placement(&self) -> &Mat4x3 {
        &self.placement
    }

    pub fn set_placement(&mut self, placement: Mat4x3) {
        self.placement = placement;
    }

    /// Evaluate `clip` at a fractional `frame`
    ///
    /// The frame wraps into the clip, negative values included. Integer
    /// frames reproduce the stored keyframes exactly.
    pub fn evaluate_into(
        &self,
        model: &Model,
        clip: &AnimationClip,
        frame: Fixed,
        pose: &mut Pose,
    ) -> Result<()> {
        check_compatible(model, clip)?;
        let sample = split_frame(frame, clip.frame_count());

        // Never None once the bone counts match
        self.compose(model, pose, |index, bone| {
            clip.track(index)
                .and_then(|track| interpolate_track(track, sample))
                .unwrap_or(bone.bind)
        });

        trace!(
            "Evaluated {} bones at frame {} ({} -> {})",
            model.bone_count(),
            frame,
            sample.current,
            sample.next
        );
        Ok(())
    }

    /// Evaluate two clips and blend them before composing the hierarchy
    ///
    /// `blend` is the weight of the second clip, clamped to `[0, 1]`. At
    /// either end the result is identical to evaluating that clip alone.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_blend_into(
        &self,
        model: &Model,
        first: &AnimationClip,
        first_frame: Fixed,
        second: &AnimationClip,
        second_frame: Fixed,
        blend: Fixed,
        pose: &mut Pose,
    ) -> Result<()> {
        check_compatible(model, first)?;
        check_compatible(model, second)?;

        let first_sample = split_frame(first_frame, first.frame_count());
        let second_sample = split_frame(second_frame, second.frame_count());

        self.compose(model, pose, |index, bone| {
            let blended = match (first.track(index), second.track(index)) {
                (Some(a), Some(b)) => {
                    interpolate_with_blend(a, first_sample, b, second_sample, blend)
                }
                _ => None,
            };
            // Never None once both bone counts match
            blended.unwrap_or(bone.bind)
        });

        trace!(
            "Evaluated {} bones blending frame {} and {} at {}",
            model.bone_count(),
            first_frame,
            second_frame,
            blend.clamp_unit()
        );
        Ok(())
    }

    /// Compose the rest pose stored in the model
    pub fn evaluate_bind_pose_into(&self, model: &Model, pose: &mut Pose) {
        self.compose(model, pose, |_, bone| bone.bind);
    }

    /// Evaluate `clip` at the position held by `state`
    pub fn evaluate_state_into(
        &self,
        model: &Model,
        clip: &AnimationClip,
        state: &AnimationState,
        pose: &mut Pose,
    ) -> Result<()> {
        self.evaluate_into(model, clip, state.frame(), pose)
    }

    /// Evaluate a blend of two clips at the positions held by `state`
    pub fn evaluate_blend_state_into(
        &self,
        model: &Model,
        first: &AnimationClip,
        second: &AnimationClip,
        state: &BlendState,
        pose: &mut Pose,
    ) -> Result<()> {
        self.evaluate_blend_into(
            model,
            first,
            state.first.frame(),
            second,
            state.second.frame(),
            state.blend(),
            pose,
        )
    }

    fn compose<F>(&self, model: &Model, pose: &mut Pose, mut local: F)
    where
        F: FnMut(usize, &Bone) -> Transform,
    {
        pose.reset(model.bone_count());

        for (index, bone) in model.bones().iter().enumerate() {
            let local = Mat4x3::from_transform(&local(index, bone));
            let parent = match bone.parent {
                // Parents precede children, so this is already final
                Some(parent) => pose.world[usize::from(parent)],
                None => self.placement,
            };
            pose.world[index] = parent.mul(&local);
        }
    }
}

fn check_compatible(model: &Model, clip: &AnimationClip) -> Result<()> {
    if clip.bone_count() as usize != model.bone_count() {
        return Err(DecodeError::Incompatible {
            clip_bones: clip.bone_count(),
            skeleton_bones: model.bone_count() as u32,
        });
    }
    Ok(())
}

/// Evaluate `clip` at `frame` into a new pose
pub fn evaluate(model: &Model, clip: &AnimationClip, frame: Fixed) -> Result<Pose> {
    let mut pose = Pose::for_model(model);
    PoseEvaluator::default().evaluate_into(model, clip, frame, &mut pose)?;
    Ok(pose)
}

/// Evaluate a blend of two clips into a new pose
pub fn evaluate_blend(
    model: &Model,
    first: &AnimationClip,
    first_frame: Fixed,
    second: &AnimationClip,
    second_frame: Fixed,
    blend: Fixed,
) -> Result<Pose> {
    let mut pose = Pose::for_model(model);
    PoseEvaluator::default().evaluate_blend_into(
        model,
        first,
        first_frame,
        second,
        second_frame,
        blend,
        &mut pose,
    )?;
    Ok(pose)
}
