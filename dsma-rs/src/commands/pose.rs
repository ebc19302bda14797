//! Pose evaluation command

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;

use dsma::{Fixed, Model};
use dsma::animation::{Pose, PoseEvaluator};

use crate::commands::dsa::load_clip;
use crate::commands::dsm::load_model;
use crate::utils::{add_table_row, create_table, format_vec3};

#[derive(Args)]
pub struct PoseArgs {
    /// Path to the DSM model
    pub model: PathBuf,

    /// Path to the DSA animation
    pub clip: PathBuf,

    /// Frame to evaluate, fractions interpolate between keyframes
    #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub frame: f32,

    /// Second DSA animation to blend with
    #[arg(long, value_name = "DSA")]
    pub blend_with: Option<PathBuf>,

    /// Frame of the second animation
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub blend_frame: f32,

    /// Weight of the second animation, clamped to 0..=1
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    pub blend: f32,

    /// Print the pose as JSON
    #[cfg(feature = "serde")]
    #[arg(long)]
    pub json: bool,
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct BoneReport {
    bone: usize,
    parent: Option<u16>,
    translation: [f32; 3],
    /// Raw 20.12 words, column-major
    matrix: [i32; 12],
}

#[cfg(feature = "serde")]
fn wants_json(args: &PoseArgs) -> bool {
    args.json
}

#[cfg(not(feature = "serde"))]
fn wants_json(_: &PoseArgs) -> bool {
    false
}

#[cfg(feature = "serde")]
fn print_json(model: &Model, pose: &Pose) -> Result<()> {
    let report: Vec<BoneReport> = pose
        .world()
        .iter()
        .zip(model.bones())
        .enumerate()
        .map(|(bone, (world, info))| {
            let t = world.translation();
            BoneReport {
                bone,
                parent: info.parent,
                translation: [t.x.to_f32(), t.y.to_f32(), t.z.to_f32()],
                matrix: world.to_raw(),
            }
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(not(feature = "serde"))]
fn print_json(_: &Model, _: &Pose) -> Result<()> {
    Ok(())
}

pub fn execute(args: PoseArgs) -> Result<()> {
    let model = load_model(&args.model)?;
    let clip = load_clip(&args.clip)?;
    let frame = Fixed::from_f32(args.frame);

    let evaluator = PoseEvaluator::new();
    let mut pose = Pose::for_model(&model);

    match &args.blend_with {
        Some(path) => {
            let second = load_clip(path)?;
            evaluator
                .evaluate_blend_into(
                    &model,
                    &clip,
                    frame,
                    &second,
                    Fixed::from_f32(args.blend_frame),
                    Fixed::from_f32(args.blend),
                    &mut pose,
                )
                .with_context(|| format!("Failed to blend with {}", path.display()))?;
        }
        None => evaluator
            .evaluate_into(&model, &clip, frame, &mut pose)
            .with_context(|| {
                format!(
                    "Failed to evaluate {} on {}",
                    args.clip.display(),
                    args.model.display()
                )
            })?,
    }

    if wants_json(&args) {
        return print_json(&model, &pose);
    }

    println!(
        "{} at frame {}",
        style("Pose").bold().cyan(),
        style(frame).yellow()
    );
    let mut table = create_table(&["Bone", "Parent", "Translation", "X axis", "Y axis", "Z axis"]);
    for (bone, (world, info)) in pose.world().iter().zip(model.bones()).enumerate() {
        add_table_row(
            &mut table,
            vec![
                bone.to_string(),
                info.parent
                    .map_or_else(|| "-".to_string(), |parent| parent.to_string()),
                format_vec3(world.translation()),
                format_vec3(world.column(0)),
                format_vec3(world.column(1)),
                format_vec3(world.column(2)),
            ],
        );
    }
    table.printstd();

    Ok(())
}
