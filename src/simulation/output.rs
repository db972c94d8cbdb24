//! Result record and samples file written after a run

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::config::TestType;
use crate::core::error::{IntrusionError, Result};
use crate::simulation::harness::HarnessReport;
use crate::simulation::ztest::{mean_variance, ZTestReport};

/// Summary of one harness run, stored as pretty JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub level: String,
    pub wins: u32,
    pub losses: u32,
    /// Minutes
    pub avg_win_time: f64,
    /// Minutes
    pub avg_loss_time: f64,
    #[serde(rename = "p-value")]
    pub p_value: f64,
    pub successes: u64,
    pub failures: u64,
    #[serde(rename = "q-value")]
    pub q_value: f64,
    pub iterations: u32,
    pub batches: u32,
    pub completed_trials: u32,
    pub captures: u64,
    pub test_type: TestType,
    pub seed: u64,
    pub interrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z_test: Option<ZTestReport>,
}

impl RunRecord {
    pub fn new(
        level: &str,
        iterations: u32,
        batches: u32,
        report: &HarnessReport,
        z_test: Option<ZTestReport>,
    ) -> Self {
        let stats = &report.statistics;
        Self {
            level: level.to_string(),
            wins: stats.wins(),
            losses: stats.losses(),
            avg_win_time: stats.avg_win_time(),
            avg_loss_time: stats.avg_loss_time(),
            p_value: stats.p_value(),
            successes: stats.successes(),
            failures: stats.failures(),
            q_value: stats.q_value(),
            iterations,
            batches,
            completed_trials: stats.completed_trials(),
            captures: stats.captures(),
            test_type: stats.test_type(),
            seed: report.seed,
            interrupted: report.interrupted,
            z_test,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        tracing::info!("Saved results to {}", path.display());
        Ok(())
    }
}

/// `<dir>/<stem>.json` and `<dir>/<stem>_samples.txt` for a config file
pub fn result_paths(output_dir: &Path, config_path: &Path) -> (PathBuf, PathBuf) {
    let stem = config_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    (
        output_dir.join(format!("{}.json", stem)),
        output_dir.join(format!("{}_samples.txt", stem)),
    )
}

/// Write samples as: mean, population variance, then one sample per line
pub fn save_samples(path: &Path, samples: &[f64]) -> Result<()> {
    let (mean, variance) = mean_variance(samples);
    let mut content = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(content, "{}", mean);
    let _ = writeln!(content, "{}", variance);
    for sample in samples {
        let _ = writeln!(content, "{}", sample);
    }
    ensure_parent(path)?;
    std::fs::write(path, content)?;
    tracing::info!("Saved {} samples to {}", samples.len(), path.display());
    Ok(())
}

/// Read a samples file; the stored mean and variance are skipped
pub fn load_samples(path: &Path) -> Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)?;
    parse_samples(&content)
}

pub fn parse_samples(content: &str) -> Result<Vec<f64>> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(IntrusionError::MalformedSamples(
            "expected mean and variance header lines".into(),
        ));
    }

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            line.parse::<f64>().map_err(|_| {
                IntrusionError::MalformedSamples(format!("line {}: '{}' is not a number", i + 1, line))
            })
        })
        .skip(2)
        .collect()
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_paths_use_config_stem() {
        let (record, samples) = result_paths(Path::new("out"), Path::new("configs/level_1.json"));
        assert_eq!(record, PathBuf::from("out/level_1.json"));
        assert_eq!(samples, PathBuf::from("out/level_1_samples.txt"));
    }

    #[test]
    fn test_parse_samples_skips_header() {
        let samples = parse_samples("0.5\n0.01\n0.4\n0.6\n").unwrap();
        assert_eq!(samples, vec![0.4, 0.6]);
    }

    #[test]
    fn test_parse_samples_rejects_garbage() {
        assert!(parse_samples("0.5\n").is_err());
        assert!(matches!(
            parse_samples("0.5\n0.1\nabc\n"),
            Err(IntrusionError::MalformedSamples(_))
        ));
    }

    #[test]
    fn test_samples_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("intrusion-samples-{}", std::process::id()));
        let path = dir.join("level_samples.txt");
        save_samples(&path, &[0.25, 0.75]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("0.5\n0.0625\n"));
        assert_eq!(load_samples(&path).unwrap(), vec![0.25, 0.75]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
