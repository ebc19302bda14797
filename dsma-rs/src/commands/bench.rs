//! Frame loop benchmark
//!
//! Animates many instances of one model against a counting backend and
//! reports how much of a 60 Hz frame the evaluation and submission take.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use log::{info, warn};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use dsma::Fixed;
use dsma::animation::{AnimationState, Pose, PoseEvaluator};
use dsma::backend::{RecordingBackend, RenderBackend, wait_for_idle};
use dsma::skinning::SkinningSubmitter;

use crate::commands::dsa::load_clip;
use crate::commands::dsm::load_model;
use crate::utils::{create_progress_bar, format_micros, format_percentage};

/// One frame at 60 Hz
const FRAME_BUDGET: Duration = Duration::from_micros(16_667);

/// Polls granted to the backend to drain after each frame
const IDLE_SPINS: u32 = 1_000_000;

#[derive(Args)]
pub struct BenchArgs {
    /// Path to the DSM model
    pub model: PathBuf,

    /// DSA animations, assigned to instances in turn
    #[arg(required = true, num_args = 1..)]
    pub clips: Vec<PathBuf>,

    /// Number of animated instances
    #[arg(short, long, default_value_t = 64)]
    pub instances: usize,

    /// Number of frames to run
    #[arg(short, long, default_value_t = 600)]
    pub frames: u32,

    /// Polls the simulated backend stays busy after each submit
    #[arg(long, default_value_t = 0)]
    pub latency: u32,
}

/// Playback speed for instance `index`, 8/64 to 17/64 frames per tick
fn instance_speed(index: usize) -> Fixed {
    Fixed::from_raw(((((index * 7) % 10) + 8) << 6) as i32)
}

pub fn execute(args: BenchArgs, quiet: bool) -> Result<()> {
    let model = load_model(&args.model)?;
    let clips = args
        .clips
        .iter()
        .map(|path| {
            let clip = load_clip(path)?;
            if clip.bone_count() as usize != model.bone_count() {
                anyhow::bail!(
                    "Animation '{}' has {} bones but the model has {}",
                    path.display(),
                    clip.bone_count(),
                    model.bone_count()
                );
            }
            Ok(clip)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut states: Vec<AnimationState> = (0..args.instances)
        .map(|i| AnimationState::for_clip(&clips[i % clips.len()]).with_speed(instance_speed(i)))
        .collect();

    let evaluator = PoseEvaluator::new();
    let submitter = SkinningSubmitter::new();
    let mut pose = Pose::for_model(&model);
    let mut backend = RecordingBackend::counting().with_latency(args.latency);

    info!(
        "Running {} instances of {} bones for {} frames",
        args.instances,
        model.bone_count(),
        args.frames
    );

    let progress = create_progress_bar(u64::from(args.frames), "frames", quiet);
    let mut total = Duration::ZERO;
    let mut worst = Duration::ZERO;
    let mut over_budget = 0u32;

    for _ in 0..args.frames {
        backend.begin_frame();
        let start = Instant::now();

        for (index, state) in states.iter_mut().enumerate() {
            let clip = &clips[index % clips.len()];
            evaluator
                .evaluate_state_into(&model, clip, state, &mut pose)
                .context("Failed to evaluate instance")?;
            submitter
                .draw(&model, &pose, &mut backend)
                .context("Failed to submit instance")?;
            state.advance();
        }

        if !wait_for_idle(&backend, IDLE_SPINS) {
            warn!("Backend did not drain within {} polls", IDLE_SPINS);
        }

        let elapsed = start.elapsed();
        total += elapsed;
        worst = worst.max(elapsed);
        if elapsed > FRAME_BUDGET {
            over_budget += 1;
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let frames = args.frames.max(1);
    let average = total / frames;
    let stats = backend.stats();

    println!("{}", style("Frame Loop Benchmark").bold().cyan());
    println!("{}", style("════════════════════").cyan());
    println!();
    println!("Instances: {}", args.instances);
    println!("Bones per instance: {}", model.bone_count());
    println!("Frames: {}", args.frames);
    println!("Average frame: {}", format_micros(average));
    println!("Worst frame: {}", format_micros(worst));
    println!(
        "Budget used: {}",
        format_percentage(average.as_secs_f64() / FRAME_BUDGET.as_secs_f64() * 100.0)
    );
    if over_budget > 0 {
        println!(
            "Frames over budget: {}",
            style(over_budget).red().bold()
        );
    }
    println!(
        "Last frame: {} polygons, {} vertices",
        stats.polygons, stats.vertices
    );

    Ok(())
}
