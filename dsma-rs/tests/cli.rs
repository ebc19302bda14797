//! CLI integration tests
//!
//! Assets are generated on the fly through the dsma crate and written to a
//! temporary directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use dsma::animation::{Quat, Transform, Vec3};
use dsma::backend::TextureHandle;
use dsma::display_list::{DisplayListBuilder, Primitive};
use dsma::{AnimationClip, Angle, Bone, Model, Submesh};

fn dsma_rs() -> Command {
    Command::cargo_bin("dsma-rs").unwrap()
}

fn triangle() -> Vec<u32> {
    DisplayListBuilder::new()
        .begin(Primitive::Triangles)
        .vertex(0, 0, 0)
        .vertex(4096, 0, 0)
        .vertex(0, 4096, 0)
        .end()
        .finish()
}

fn arm_model() -> Model {
    Model::new(
        vec![
            Bone::root(Transform::IDENTITY),
            Bone::child(0, Transform::from_translation(Vec3::Y)),
            Bone::child(1, Transform::from_translation(Vec3::Y)),
        ],
        vec![
            Submesh::new(0, Some(TextureHandle(3)), triangle()),
            Submesh::new(1, None, triangle()),
            Submesh::new(2, Some(TextureHandle(3)), triangle()),
        ],
    )
    .unwrap()
}

fn wave_clip(bones: u16, frames: u32, step: i32) -> AnimationClip {
    let tracks = (0..bones)
        .map(|bone| {
            (0..frames)
                .map(|frame| {
                    let offset = if bone == 0 { Vec3::ZERO } else { Vec3::Y };
                    Transform::from_translation_rotation(
                        offset,
                        Quat::from_rotation_z(Angle::from_degrees_int(frame as i32 * step)),
                    )
                })
                .collect()
        })
        .collect();
    AnimationClip::new(frames, tracks).unwrap()
}

struct Assets {
    _dir: TempDir,
    model: PathBuf,
    clip: PathBuf,
    other_clip: PathBuf,
    wrong_clip: PathBuf,
}

fn write_assets() -> Assets {
    let dir = TempDir::new().unwrap();
    let write = |name: &str, bytes: Vec<u8>| -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path
    };

    let model = write("arm.dsm", arm_model().to_bytes());
    let clip = write("wave.dsa", wave_clip(3, 4, 30).to_bytes());
    let other_clip = write("still.dsa", wave_clip(3, 1, 0).to_bytes());
    let wrong_clip = write("tail.dsa", wave_clip(5, 2, 10).to_bytes());

    Assets {
        _dir: dir,
        model,
        clip,
        other_clip,
        wrong_clip,
    }
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn dsm_info_lists_skeleton_and_submeshes() {
    let assets = write_assets();
    dsma_rs()
        .args(["dsm", "info", arg(&assets.model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("DSM Model Information"))
        .stdout(predicate::str::contains("Bones: 3 (1 roots)"))
        .stdout(predicate::str::contains("Submeshes: 3"))
        .stdout(predicate::str::contains("Polygons: 3"));
}

#[test]
fn dsm_info_detailed_lists_commands() {
    let assets = write_assets();
    dsma_rs()
        .args(["dsm", "info", "--detailed", arg(&assets.model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submesh 2 commands"))
        .stdout(predicate::str::contains("Vtx16"));
}

#[test]
fn dsa_info_reports_counts() {
    let assets = write_assets();
    dsma_rs()
        .args(["dsa", "info", "-d", arg(&assets.clip)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Frames: 4"))
        .stdout(predicate::str::contains("Keyframes: 12"))
        .stdout(predicate::str::contains("Largest step"));
}

#[test]
fn dsa_validate_checks_model() {
    let assets = write_assets();
    dsma_rs()
        .args(["dsa", "validate", arg(&assets.clip), "--model", arg(&assets.model)])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    dsma_rs()
        .args([
            "dsa",
            "validate",
            arg(&assets.wrong_clip),
            "--model",
            arg(&assets.model),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has 5 bones"));
}

#[test]
fn swapped_files_fail_to_load() {
    let assets = write_assets();
    dsma_rs()
        .args(["dsm", "validate", arg(&assets.clip)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load DSM model"));
}

#[test]
fn pose_json_places_child_bones() {
    let assets = write_assets();
    let output = dsma_rs()
        .args([
            "pose",
            arg(&assets.model),
            arg(&assets.clip),
            "--frame",
            "0",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let bones = report.as_array().unwrap();
    assert_eq!(bones.len(), 3);
    assert_eq!(bones[0]["parent"], serde_json::Value::Null);
    assert_eq!(bones[2]["parent"], 1);
    // Frame 0 has no rotation, so the chain stands straight up
    let y = bones[2]["translation"][1].as_f64().unwrap();
    assert!((y - 2.0).abs() < 1e-3, "{y}");
}

#[test]
fn pose_blend_and_mismatch() {
    let assets = write_assets();
    dsma_rs()
        .args([
            "pose",
            arg(&assets.model),
            arg(&assets.clip),
            "--frame",
            "1.5",
            "--blend-with",
            arg(&assets.other_clip),
            "--blend",
            "0.25",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pose"));

    dsma_rs()
        .args(["pose", arg(&assets.model), arg(&assets.wrong_clip)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to evaluate"));
}

#[test]
fn bench_reports_budget() {
    let assets = write_assets();
    dsma_rs()
        .args([
            "-q",
            "bench",
            arg(&assets.model),
            arg(&assets.clip),
            arg(&assets.other_clip),
            "--instances",
            "10",
            "--frames",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget used"))
        .stdout(predicate::str::contains("Last frame: 30 polygons, 90 vertices"));
}

#[test]
fn completions_generate() {
    dsma_rs()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dsma-rs"));
}
