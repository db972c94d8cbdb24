//! Offline Z-test over a samples file written by a previous run

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use intrusion_game::core::error::Result;
use intrusion_game::simulation::output::load_samples;
use intrusion_game::simulation::{z_test, SampleMethod};

#[derive(Parser, Debug)]
#[command(name = "analyze_samples")]
#[command(about = "Z-test the samples of a finished run against an expected value")]
struct Args {
    /// Samples file (mean, variance, then one sample per line)
    samples: PathBuf,

    /// Expected value to test against
    #[arg(long, short = 'o')]
    observed: f64,

    /// Confidence level (0.75, 0.90, 0.95, 0.99, ...)
    #[arg(long, default_value_t = 0.75)]
    confidence: f64,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("intrusion_game=info")),
        )
        .init();

    let args = Args::parse();
    let samples = load_samples(&args.samples)?;
    tracing::info!("Read {} samples from {}", samples.len(), args.samples.display());

    let report = z_test(&samples, args.observed, args.confidence, SampleMethod::File)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Samples:      {}", report.samples);
    println!("Sample mean:  {:.6}", report.sample_mean);
    println!("Variance:     {:.6}", report.variance);
    println!("Std error:    {:.6}", report.std_error);
    println!("Observed:     {:.6}", report.observed);
    println!("Z:            {:.4}", report.z);
    println!(
        "Critical:     {:.4} at {:.0}% confidence",
        report.critical,
        report.confidence * 100.0
    );
    println!(
        "Result:       {}",
        if report.passed {
            "consistent with the observed mean"
        } else {
            "rejected"
        }
    );
    Ok(())
}
