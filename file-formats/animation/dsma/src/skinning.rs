//! Rigid skinning submission
//!
//! Every submesh is bound to exactly one bone. Drawing a submesh means
//! saving the current matrix, multiplying it by the bone's world matrix,
//! sending the submesh's command words unchanged and restoring the matrix.
//! The restore is tied to a guard so it also happens when the backend fails
//! part way through.
//!
//! # Example
//!
//! ```rust,no_run
//! use dsma::animation::evaluate;
//! use dsma::backend::RecordingBackend;
//! use dsma::skinning::{SkinningSubmitter, SubmitOptions};
//! use dsma::{AnimationClip, Fixed, Model};
//!
//! let model = Model::load_file("robot.dsm")?;
//! let clip = AnimationClip::load_file("robot_wave.dsa")?;
//! let pose = evaluate(&model, &clip, Fixed::from_raw(0x1800))?;
//!
//! let mut backend = RecordingBackend::new();
//! let submitter = SkinningSubmitter::with_options(SubmitOptions {
//!     bind_textures: false,
//!     ..Default::default()
//! });
//! submitter.draw(&model, &pose, &mut backend)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use log::warn;

use crate::animation::Pose;
use crate::backend::{RenderBackend, TextureHandle};
use crate::model::Model;

/// Saved matrix that is restored when the scope ends
///
/// Call [`finish`](Self::finish) to restore and observe the result. A scope
/// dropped without `finish` still restores, logging any failure.
pub struct MatrixScope<'a, B: RenderBackend + ?Sized> {
    backend: &'a mut B,
    open: bool,
}

impl<'a, B: RenderBackend + ?Sized> MatrixScope<'a, B> {
    /// Push the current matrix
    pub fn push(backend: &'a mut B) -> Result<Self, B::Error> {
        backend.push_matrix()?;
        Ok(Self {
            backend,
            open: true,
        })
    }

    /// The backend, for drawing inside the scope
    pub fn backend(&mut self) -> &mut B {
        &mut *self.backend
    }

    /// Pop the matrix saved by [`push`](Self::push)
    pub fn finish(mut self) -> Result<(), B::Error> {
        self.open = false;
        self.backend.pop_matrix()
    }
}

impl<B: RenderBackend + ?Sized> Drop for MatrixScope<'_, B> {
    fn drop(&mut self) {
        if self.open
            && let Err(e) = self.backend.pop_matrix()
        {
            warn!("Failed to restore matrix after an interrupted submesh: {e}");
        }
    }
}

/// Options for [`SkinningSubmitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Bind each submesh's texture, skipping redundant binds
    pub bind_textures: bool,
    /// Skip submeshes without command words instead of submitting them
    pub skip_empty: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            bind_textures: true,
            skip_empty: true,
        }
    }
}

/// Sends a posed model to a [`RenderBackend`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinningSubmitter {
    options: SubmitOptions,
}

impl SkinningSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SubmitOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SubmitOptions {
        &self.options
    }

    /// Draw every submesh of `model` in order, positioned by `pose`
    ///
    /// The backend's matrix stack is left as it was found, also on error.
    /// Submeshes whose bone is missing from `pose` are skipped.
    pub fn draw<B: RenderBackend + ?Sized>(
        &self,
        model: &Model,
        pose: &Pose,
        backend: &mut B,
    ) -> Result<(), B::Error> {
        let mut bound: Option<TextureHandle> = None;
        let mut skipped = 0usize;

        for submesh in model.submeshes() {
            if self.options.skip_empty && submesh.commands.is_empty() {
                continue;
            }
            let Some(world) = pose.bone(usize::from(submesh.bone)) else {
                skipped += 1;
                continue;
            };

            if self.options.bind_textures
                && let Some(texture) = submesh.texture.filter(|&t| bound != Some(t))
            {
                backend.bind_texture(texture)?;
                bound = Some(texture);
            }

            let mut scope = MatrixScope::push(backend)?;
            scope.backend().multiply_matrix(world)?;
            scope.backend().submit(&submesh.commands)?;
            scope.finish()?;
        }

        if skipped > 0 {
            warn!(
                "Pose has {} bones but the model has {}, skipped {} submeshes",
                pose.len(),
                model.bone_count(),
                skipped
            );
        }

        Ok(())
    }
}

/// Draw `model` with default options
pub fn draw<B: RenderBackend + ?Sized>(
    model: &Model,
    pose: &Pose,
    backend: &mut B,
) -> Result<(), B::Error> {
    SkinningSubmitter::default().draw(model, pose, backend)
}
