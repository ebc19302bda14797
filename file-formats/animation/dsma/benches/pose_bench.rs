use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use dsma::animation::{
    AnimationState, Pose, PoseEvaluator, Quat, Transform, Vec3, evaluate_blend,
};
use dsma::backend::RecordingBackend;
use dsma::display_list::{DisplayListBuilder, Primitive};
use dsma::skinning;
use dsma::{AnimationClip, Angle, Bone, Fixed, Model, Submesh};

fn create_test_model(bones: u16) -> Model {
    let mut commands = DisplayListBuilder::new();
    commands.begin(Primitive::Triangles);
    for i in 0..12 {
        commands.vertex(i * 256, (i % 3) * 256, 0);
    }
    let commands = commands.end().finish();

    let skeleton = (0..bones)
        .map(|i| match i {
            0 => Bone::root(Transform::IDENTITY),
            // Two limbs hanging off the root
            i => Bone::child(
                if i <= 2 { 0 } else { i - 2 },
                Transform::from_translation(Vec3::Y),
            ),
        })
        .collect();
    let submeshes = (0..bones)
        .map(|i| Submesh::new(i, None, commands.clone()))
        .collect();
    Model::new(skeleton, submeshes).unwrap()
}

fn create_test_clip(frames: u32, bones: u16, step: i32) -> AnimationClip {
    let tracks = (0..bones)
        .map(|bone| {
            (0..frames)
                .map(|frame| {
                    Transform::from_translation_rotation(
                        Vec3::Y,
                        Quat::from_rotation_x(Angle::from_degrees_int(
                            (frame as i32 + i32::from(bone)) * step,
                        )),
                    )
                })
                .collect()
        })
        .collect();
    AnimationClip::new(frames, tracks).unwrap()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for bones in [8u16, 32, 128] {
        let model = create_test_model(bones);
        let clip = create_test_clip(30, bones, 12);
        let evaluator = PoseEvaluator::default();
        let mut pose = Pose::for_model(&model);

        group.bench_with_input(BenchmarkId::from_parameter(bones), &bones, |b, _| {
            let mut state = AnimationState::for_clip(&clip).with_speed(Fixed::from_raw(1 << 9));
            b.iter(|| {
                evaluator
                    .evaluate_state_into(&model, &clip, &state, &mut pose)
                    .unwrap();
                state.advance();
                black_box(&pose);
            })
        });
    }
    group.finish();
}

fn bench_blend(c: &mut Criterion) {
    let model = create_test_model(32);
    let walk = create_test_clip(30, 32, 12);
    let wave = create_test_clip(17, 32, -20);

    c.bench_function("evaluate_blend_32", |b| {
        b.iter(|| {
            evaluate_blend(
                &model,
                &walk,
                black_box(Fixed::from_raw(0x5300)),
                &wave,
                black_box(Fixed::from_raw(0x2A00)),
                Fixed::HALF,
            )
            .unwrap()
        })
    });
}

fn bench_instances(c: &mut Criterion) {
    let model = create_test_model(16);
    let clip = create_test_clip(24, 16, 15);
    let evaluator = PoseEvaluator::default();
    let mut pose = Pose::for_model(&model);
    let mut backend = RecordingBackend::counting();

    let mut states: Vec<_> = (0..64)
        .map(|i| {
            AnimationState::for_clip(&clip).with_speed(Fixed::from_raw((((i * 7) % 10) + 8) << 6))
        })
        .collect();

    c.bench_function("evaluate_and_draw_64_instances", |b| {
        b.iter(|| {
            backend.begin_frame();
            for state in &mut states {
                evaluator
                    .evaluate_state_into(&model, &clip, state, &mut pose)
                    .unwrap();
                skinning::draw(&model, &pose, &mut backend).unwrap();
                state.advance();
            }
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_blend, bench_instances);
criterion_main!(benches);
