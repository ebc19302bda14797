//! Asset builders shared by the integration tests

#![allow(dead_code)]

use dsma::animation::{Quat, Transform, Vec3};
use dsma::backend::TextureHandle;
use dsma::display_list::{DisplayListBuilder, Primitive};
use dsma::{AnimationClip, Angle, Bone, Fixed, Model, Submesh};

/// One textured quad, four vertices and one polygon
pub fn quad() -> Vec<u32> {
    DisplayListBuilder::new()
        .begin(Primitive::Quads)
        .texcoord(0, 0)
        .vertex(-2048, 0, 0)
        .texcoord(256, 0)
        .vertex(2048, 0, 0)
        .texcoord(256, 256)
        .vertex(2048, 4096, 0)
        .texcoord(0, 256)
        .vertex(-2048, 4096, 0)
        .end()
        .finish()
}

/// A strip of `triangles` triangles
pub fn strip(triangles: i16) -> Vec<u32> {
    let mut builder = DisplayListBuilder::new();
    builder.begin(Primitive::TriangleStrip);
    for i in 0..triangles + 2 {
        builder.vertex(i * 512, (i % 2) * 512, 0);
    }
    builder.end();
    builder.finish()
}

/// A chain of `bones` bones, each one unit above its parent, with one quad
/// per bone and textures alternating between two handles
pub fn chain_model(bones: u16) -> Model {
    let skeleton = (0..bones)
        .map(|i| {
            if i == 0 {
                Bone::root(Transform::IDENTITY)
            } else {
                Bone::child(i - 1, Transform::from_translation(Vec3::Y))
            }
        })
        .collect();
    let submeshes = (0..bones)
        .map(|i| Submesh::new(i, Some(TextureHandle(u32::from(i % 2))), quad()))
        .collect();
    Model::new(skeleton, submeshes).unwrap()
}

/// Every bone rotates `step_degrees` around Z per frame and keeps its
/// one unit offset; the root also drifts along X
pub fn bend_clip(frames: u32, bones: u16, step_degrees: i32) -> AnimationClip {
    let tracks = (0..bones)
        .map(|bone| {
            (0..frames)
                .map(|frame| {
                    let rotation =
                        Quat::from_rotation_z(Angle::from_degrees_int(frame as i32 * step_degrees));
                    let translation = if bone == 0 {
                        Vec3::new(Fixed::from_int(frame as i32), Fixed::ZERO, Fixed::ZERO)
                    } else {
                        Vec3::Y
                    };
                    Transform::from_translation_rotation(translation, rotation)
                })
                .collect()
        })
        .collect();
    AnimationClip::new(frames, tracks).unwrap()
}

/// Clip where every keyframe of every bone is different, including scale
pub fn noisy_clip(frames: u32, bones: u16) -> AnimationClip {
    let tracks = (0..bones)
        .map(|bone| {
            (0..frames)
                .map(|frame| {
                    let seed = i32::from(bone) * 31 + frame as i32 * 17;
                    Transform::new(
                        Vec3::from_f32(seed as f32 * 0.125, -(seed % 7) as f32, 0.5),
                        Quat::from_axis_angle(
                            Vec3::X,
                            Angle::from_degrees_int(seed * 13),
                        ),
                        Vec3::from_f32(1.0 + (seed % 3) as f32 * 0.25, 1.0, 1.0),
                    )
                })
                .collect()
        })
        .collect();
    AnimationClip::new(frames, tracks).unwrap()
}

/// Little-endian DSM header
pub fn dsm_header(version: u32, bones: u32, submeshes: u32) -> Vec<u8> {
    let mut out = b"DSMF".to_vec();
    for word in [version, bones, submeshes] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

/// Zero translation, identity rotation, unit scale
pub const IDENTITY_WORDS: [i32; 10] = [0, 0, 0, 0, 0, 0, 4096, 4096, 4096, 4096];

/// Serialized bone record with an identity bind pose
pub fn dsm_bone(parent: i32) -> Vec<u8> {
    dsm_bone_with(parent, IDENTITY_WORDS)
}

/// Serialized bone record with raw translation, rotation and scale words
pub fn dsm_bone_with(parent: i32, transform: [i32; 10]) -> Vec<u8> {
    let mut out = parent.to_le_bytes().to_vec();
    out.extend(transform_bytes(transform));
    out
}

/// Raw transform words as stored in both formats
pub fn transform_bytes(words: [i32; 10]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

/// Serialized submesh record
pub fn dsm_submesh(bone: u32, texture: u32, words: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in [bone, texture, words.len() as u32] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for word in words {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

/// Little-endian DSA header
pub fn dsa_header(version: u32, frames: u32, bones: u32) -> Vec<u8> {
    let mut out = b"DSAF".to_vec();
    for word in [version, frames, bones] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    out
}

/// Rotation and translation of a world matrix, in floating point
pub fn decompose(matrix: &dsma::animation::Mat4x3) -> (glam::Quat, glam::Vec3) {
    let (_, rotation, translation) = matrix.to_mat4().to_scale_rotation_translation();
    (rotation, translation)
}
