//! Submitting posed models to a backend

mod common;

use dsma::animation::{Pose, Transform, evaluate};
use dsma::backend::{
    BackendEvent, RecordingBackend, RecordingError, RenderBackend, RenderStats, TextureHandle,
    wait_for_idle,
};
use dsma::skinning::{self, SkinningSubmitter, SubmitOptions};
use dsma::{Bone, Fixed, Model, Submesh};
use pretty_assertions::assert_eq;

use common::{bend_clip, chain_model, quad, strip};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn draws_each_submesh_in_its_own_scope() {
    init_logging();
    let model = chain_model(3);
    let clip = bend_clip(4, 3, 30);
    let pose = evaluate(&model, &clip, Fixed::from_raw(6000)).unwrap();

    let mut backend = RecordingBackend::new();
    skinning::draw(&model, &pose, &mut backend).unwrap();

    let words = quad().len();
    let mut expected = Vec::new();
    for (bone, world) in pose.world().iter().enumerate() {
        expected.push(BackendEvent::BindTexture(TextureHandle(bone as u32 % 2)));
        expected.push(BackendEvent::PushMatrix);
        expected.push(BackendEvent::MultiplyMatrix(world.to_raw()));
        expected.push(BackendEvent::Submit { words });
        expected.push(BackendEvent::PopMatrix);
    }
    assert_eq!(backend.events(), expected.as_slice());
    assert_eq!(backend.depth(), 0);
    assert_eq!(backend.max_depth(), 1);
}

#[test]
fn texture_bound_only_when_it_changes() {
    let model = Model::new(
        vec![Bone::root(Transform::IDENTITY)],
        vec![
            Submesh::new(0, Some(TextureHandle(7)), quad()),
            Submesh::new(0, Some(TextureHandle(7)), quad()),
            Submesh::new(0, None, quad()),
            Submesh::new(0, Some(TextureHandle(7)), quad()),
            Submesh::new(0, Some(TextureHandle(9)), quad()),
        ],
    )
    .unwrap();
    let mut pose = Pose::default();
    dsma::animation::PoseEvaluator::new().evaluate_bind_pose_into(&model, &mut pose);

    let mut backend = RecordingBackend::new();
    skinning::draw(&model, &pose, &mut backend).unwrap();

    let binds: Vec<_> = backend
        .events()
        .iter()
        .filter_map(|event| match event {
            BackendEvent::BindTexture(texture) => Some(texture.0),
            _ => None,
        })
        .collect();
    assert_eq!(binds, vec![7, 9]);
}

#[test]
fn options_control_binding_and_empty_blocks() {
    let model = Model::new(
        vec![Bone::root(Transform::IDENTITY)],
        vec![
            Submesh::new(0, Some(TextureHandle(1)), quad()),
            Submesh::new(0, None, vec![]),
        ],
    )
    .unwrap();
    let pose = Pose::for_model(&model);

    let mut backend = RecordingBackend::new();
    SkinningSubmitter::with_options(SubmitOptions {
        bind_textures: false,
        skip_empty: false,
    })
    .draw(&model, &pose, &mut backend)
    .unwrap();

    assert_eq!(backend.submits(), 2);
    assert!(
        !backend
            .events()
            .iter()
            .any(|event| matches!(event, BackendEvent::BindTexture(_)))
    );

    let mut backend = RecordingBackend::new();
    SkinningSubmitter::new()
        .draw(&model, &pose, &mut backend)
        .unwrap();
    assert_eq!(backend.submits(), 1);
}

#[test]
fn failed_submit_restores_matrix_stack() {
    init_logging();
    let model = chain_model(4);
    let pose = Pose::for_model(&model);

    let mut backend = RecordingBackend::new().fail_on_submit(2);
    let err = skinning::draw(&model, &pose, &mut backend).unwrap_err();
    assert_eq!(err, RecordingError::Injected(2));
    assert_eq!(backend.depth(), 0);
    assert_eq!(backend.events().last(), Some(&BackendEvent::PopMatrix));
}

#[test]
fn short_pose_skips_missing_bones() {
    init_logging();
    let model = chain_model(3);
    let pose = Pose::new(2);

    let mut backend = RecordingBackend::new();
    skinning::draw(&model, &pose, &mut backend).unwrap();
    assert_eq!(backend.submits(), 2);
    assert_eq!(backend.depth(), 0);
}

#[test]
fn stats_after_idle_match_model_geometry() {
    let model = Model::new(
        vec![
            Bone::root(Transform::IDENTITY),
            Bone::child(0, Transform::IDENTITY),
        ],
        vec![Submesh::new(0, None, quad()), Submesh::new(1, None, strip(6))],
    )
    .unwrap();
    let clip = bend_clip(2, 2, 45);
    let pose = evaluate(&model, &clip, Fixed::HALF).unwrap();

    let mut backend = RecordingBackend::counting().with_latency(50);
    skinning::draw(&model, &pose, &mut backend).unwrap();

    assert!(!backend.is_idle());
    assert!(wait_for_idle(&backend, 100));
    assert_eq!(
        backend.stats(),
        RenderStats {
            polygons: 1 + 6,
            vertices: 4 + 8,
        }
    );
    let summary = model.summary();
    assert_eq!(summary.polygons, 7);
    assert_eq!(summary.vertices, 12);
}

#[test]
fn many_instances_keep_stack_balanced() {
    let model = chain_model(8);
    let clip = bend_clip(12, 8, 10);
    let evaluator = dsma::animation::PoseEvaluator::new();
    let mut pose = Pose::for_model(&model);
    let mut backend = RecordingBackend::counting();

    for instance in 0..40 {
        let frame = Fixed::from_raw(instance * ((instance * 7) % 10 + 8) << 6);
        evaluator
            .evaluate_into(&model, &clip, frame, &mut pose)
            .unwrap();
        skinning::draw(&model, &pose, &mut backend).unwrap();
    }

    assert_eq!(backend.depth(), 0);
    assert_eq!(backend.submits(), 40 * 8);
    assert_eq!(backend.stats().polygons, 40 * 8);
}
