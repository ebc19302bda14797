//! Root CLI structure for dsma-rs

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dsma-rs")]
#[command(about = "Command-line tools for DSM models and DSA animations", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// DSM model operations
    Dsm {
        #[command(subcommand)]
        command: crate::commands::dsm::DsmCommands,
    },

    /// DSA animation operations
    Dsa {
        #[command(subcommand)]
        command: crate::commands::dsa::DsaCommands,
    },

    /// Evaluate a model at one animation frame and print the bone matrices
    Pose(crate::commands::pose::PoseArgs),

    /// Animate many model instances without a renderer and report frame times
    Bench(crate::commands::bench::BenchArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
