//! DSM model command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

use dsma::Model;
use dsma::display_list::DisplayList;

use crate::utils::{add_table_row, create_table, format_bytes, format_vec3};

#[derive(Subcommand)]
pub enum DsmCommands {
    /// Display information about a DSM model file
    Info {
        /// Path to the DSM file
        file: PathBuf,

        /// List the display list commands of every submesh
        #[arg(short, long)]
        detailed: bool,
    },

    /// Check that a DSM model file loads cleanly
    Validate {
        /// Path to the DSM file
        file: PathBuf,
    },
}

pub fn execute(cmd: DsmCommands) -> Result<()> {
    match cmd {
        DsmCommands::Info { file, detailed } => handle_info(&file, detailed),
        DsmCommands::Validate { file } => handle_validate(&file),
    }
}

pub(crate) fn load_model(path: &Path) -> Result<Model> {
    Model::load_file(path).with_context(|| format!("Failed to load DSM model: {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let model = load_model(path)?;
    let size = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata: {}", path.display()))?
        .len();
    let summary = model.summary();

    println!("{}", style("DSM Model Information").bold().cyan());
    println!("{}", style("═════════════════════").cyan());
    println!();
    println!("File: {}", path.display());
    println!("Size: {}", format_bytes(size));
    println!(
        "Bones: {} ({} roots)",
        model.bone_count(),
        model.roots().count()
    );
    println!("Submeshes: {}", model.submesh_count());
    println!("Vertices: {}", summary.vertices);
    println!("Polygons: {}", summary.polygons);

    println!();
    println!("{}", style("Skeleton").bold());
    let mut bones = create_table(&["Bone", "Parent", "Bind translation", "Bind scale"]);
    for (index, bone) in model.bones().iter().enumerate() {
        add_table_row(
            &mut bones,
            vec![
                index.to_string(),
                bone.parent
                    .map_or_else(|| "-".to_string(), |parent| parent.to_string()),
                format_vec3(bone.bind.translation),
                format_vec3(bone.bind.scale),
            ],
        );
    }
    bones.printstd();

    if model.submesh_count() > 0 {
        println!();
        println!("{}", style("Submeshes").bold());
        let mut submeshes =
            create_table(&["Submesh", "Bone", "Texture", "Words", "Vertices", "Polygons"]);
        for (index, submesh) in model.submeshes().iter().enumerate() {
            let summary = submesh.summary();
            add_table_row(
                &mut submeshes,
                vec![
                    index.to_string(),
                    submesh.bone.to_string(),
                    submesh
                        .texture
                        .map_or_else(|| "-".to_string(), |texture| texture.0.to_string()),
                    submesh.commands.len().to_string(),
                    summary.vertices.to_string(),
                    summary.polygons.to_string(),
                ],
            );
        }
        submeshes.printstd();
    }

    if detailed {
        for (index, submesh) in model.submeshes().iter().enumerate() {
            println!();
            println!("{}", style(format!("Submesh {index} commands")).bold());
            for command in DisplayList::new(&submesh.commands).commands() {
                // Loading already validated every list
                let command = command.map_err(|reason| anyhow::anyhow!("{reason}"))?;
                println!(
                    "  [{:4}] {:?} {:08X?}",
                    command.word, command.op, command.params
                );
            }
        }
    }

    Ok(())
}

fn handle_validate(path: &Path) -> Result<()> {
    let model = load_model(path)?;
    println!(
        "✓ DSM model '{}' is valid ({} bones, {} submeshes)",
        style(path.display()).cyan(),
        style(model.bone_count()).yellow(),
        style(model.submesh_count()).yellow()
    );
    Ok(())
}
