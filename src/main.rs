//! Intrusion Game - Entry Point
//!
//! Loads a level file, runs the Monte Carlo harness over it and stores the
//! result record and samples next to each other in the output directory.
//! Ctrl-C stops the run after the current trial is discarded.

use std::path::PathBuf;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use intrusion_game::core::config::GameConfig;
use intrusion_game::core::error::Result;
use intrusion_game::simulation::output::{result_paths, save_samples};
use intrusion_game::simulation::{z_test, Harness, RunRecord, SampleMethod, StopHandle};

/// Simulates a physical intrusion game and estimates its p or q value
#[derive(Parser, Debug)]
#[command(name = "intrusion-game")]
#[command(about = "Monte Carlo simulation of a physical intrusion game")]
struct Args {
    /// Level file (JSON, or TOML with a .toml extension)
    #[arg(long, short = 'c')]
    config: PathBuf,

    /// Trials per batch (overrides the level file)
    #[arg(long, short = 'i')]
    iterations: Option<u32>,

    /// Number of batches (overrides the level file)
    #[arg(long, short = 'b')]
    batches: Option<u32>,

    /// Ticks simulated between stop checks
    #[arg(long)]
    cycles: Option<u32>,

    /// Master seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Expected value to Z-test the samples against
    #[arg(long, short = 'o')]
    observed: Option<f64>,

    /// Confidence level of the Z-test
    #[arg(long)]
    confidence: Option<f64>,

    /// Run the trials of each batch on the rayon pool
    #[arg(long)]
    parallel: bool,

    /// Directory for the result record and samples file
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Only log warnings and errors
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = GameConfig::load(&args.config)?;
    if let Some(cycles) = args.cycles {
        config.cycles_per_frame = cycles;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }

    let default_filter = if args.quiet {
        "intrusion_game=warn"
    } else if config.log_debug {
        "intrusion_game=debug"
    } else {
        "intrusion_game=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Intrusion game starting with {}", args.config.display());

    let stop = StopHandle::new();
    let rt = Runtime::new()?;
    let signal_stop = stop.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Stop requested, finishing with completed trials");
            signal_stop.request_stop();
        }
    });

    let observed = args.observed.or(config.observed_mean);
    let confidence = config.confidence;
    let name = config.name().to_string();

    let mut harness = Harness::new(config)?
        .with_parallel(args.parallel)
        .with_stop(stop);
    if let Some(iterations) = args.iterations {
        harness = harness.with_iterations(iterations);
    }
    if let Some(batches) = args.batches {
        harness = harness.with_batches(batches);
    }

    let iterations = harness.iterations();
    let batches = harness.batches();
    let report = harness.run()?;
    let stats = &report.statistics;
    let samples = stats.test_samples();

    let z = match observed {
        Some(observed) => {
            let method = if stats.batches().len() > 1 {
                SampleMethod::Batches
            } else {
                SampleMethod::Trials
            };
            let z = z_test(&samples, observed, confidence, method)?;
            tracing::info!(
                "Z-test: sample mean {:.6}, variance {:.6}, Z={:.4}, critical {:.4}: {}",
                z.sample_mean,
                z.variance,
                z.z,
                z.critical,
                if z.passed { "passed" } else { "failed" }
            );
            Some(z)
        }
        None => None,
    };

    println!("=========================================");
    println!(
        "{} trials of {} done{}",
        stats.completed_trials(),
        name,
        if report.interrupted { " (interrupted)" } else { "" }
    );
    println!("The attacker won {} games and lost {}", stats.wins(), stats.losses());
    println!("Average win time {:.4} minutes", stats.avg_win_time());
    println!("Average loss time {:.4} minutes", stats.avg_loss_time());
    println!("Calculated p value = {:.6}", stats.p_value());
    println!("Calculated q value = {:.6}", stats.q_value());
    println!("=========================================");

    let (record_path, samples_path) = result_paths(&args.output_dir, &args.config);
    let record = RunRecord::new(&name, iterations, batches, &report, z);
    record.save(&record_path)?;
    save_samples(&samples_path, &samples)?;

    rt.shutdown_background();
    Ok(())
}
