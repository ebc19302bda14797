//! DSA animation command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

use dsma::animation::Quat;
use dsma::{AnimationClip, get_frame_count};

use crate::commands::dsm::load_model;
use crate::utils::{add_table_row, create_table, format_bytes, format_vec3};

#[derive(Subcommand)]
pub enum DsaCommands {
    /// Display information about a DSA animation file
    Info {
        /// Path to the DSA file
        file: PathBuf,

        /// Show per-bone track details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Check that a DSA animation file loads cleanly
    Validate {
        /// Path to the DSA file
        file: PathBuf,

        /// Also check that the clip drives this DSM model
        #[arg(short, long, value_name = "DSM")]
        model: Option<PathBuf>,
    },
}

pub fn execute(cmd: DsaCommands) -> Result<()> {
    match cmd {
        DsaCommands::Info { file, detailed } => handle_info(&file, detailed),
        DsaCommands::Validate { file, model } => handle_validate(&file, model.as_deref()),
    }
}

pub(crate) fn load_clip(path: &Path) -> Result<AnimationClip> {
    AnimationClip::load_file(path)
        .with_context(|| format!("Failed to load DSA animation: {}", path.display()))
}

/// Rotation angle of a unit quaternion in degrees
fn rotation_degrees(q: &Quat) -> f32 {
    let w = q.w.to_f32().abs().min(1.0);
    2.0 * w.acos().to_degrees()
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let clip = load_clip(path)?;
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .len();

    println!("{}", style("DSA Animation Information").bold().cyan());
    println!("{}", style("═════════════════════════").cyan());
    println!();
    println!("File: {}", path.display());
    println!("Size: {}", format_bytes(size));
    println!("Frames: {}", get_frame_count(&clip));
    println!("Bones: {}", clip.bone_count());
    println!(
        "Keyframes: {}",
        u64::from(clip.frame_count()) * u64::from(clip.bone_count())
    );

    if detailed {
        println!();
        println!("{}", style("Tracks").bold());
        let mut table = create_table(&[
            "Bone",
            "First translation",
            "Last translation",
            "First rotation",
            "Largest step",
        ]);
        for (bone, track) in clip.tracks().enumerate() {
            let (Some(first), Some(last)) = (track.first(), track.last()) else {
                continue;
            };
            let largest_step = track
                .windows(2)
                .map(|pair| {
                    let dot = pair[0].rotation.dot(&pair[1].rotation).to_f32();
                    2.0 * dot.abs().min(1.0).acos().to_degrees()
                })
                .fold(0.0f32, f32::max);
            add_table_row(
                &mut table,
                vec![
                    bone.to_string(),
                    format_vec3(first.translation),
                    format_vec3(last.translation),
                    format!("{:.1}°", rotation_degrees(&first.rotation)),
                    format!("{largest_step:.1}°"),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn handle_validate(path: &Path, model: Option<&Path>) -> Result<()> {
    let clip = load_clip(path)?;

    if let Some(model_path) = model {
        let model = load_model(model_path)?;
        if clip.bone_count() as usize != model.bone_count() {
            anyhow::bail!(
                "Animation has {} bones but model '{}' has {}",
                clip.bone_count(),
                model_path.display(),
                model.bone_count()
            );
        }
    }

    println!(
        "✓ DSA animation '{}' is valid ({} frames, {} bones)",
        style(path.display()).cyan(),
        style(clip.frame_count()).yellow(),
        style(clip.bone_count()).yellow()
    );
    Ok(())
}
