//! One-sample Z-test of an observed mean against simulated samples

use serde::{Deserialize, Serialize};

use crate::core::error::{IntrusionError, Result};

/// Where the samples of a report came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleMethod {
    /// One sample per trial
    Trials,
    /// One sample per batch of trials
    Batches,
    /// Read back from a samples file
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZTestReport {
    pub observed: f64,
    pub confidence: f64,
    pub sample_mean: f64,
    pub variance: f64,
    pub std_error: f64,
    /// Infinite when the samples have no spread (or there are none)
    pub z: f64,
    pub critical: f64,
    pub passed: bool,
    pub samples: usize,
    pub method: SampleMethod,
}

/// Mean and population variance (divides by `n`); zeros for no samples
pub fn mean_variance(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

/// Two-sided critical value for a confidence level in (0, 1)
pub fn critical_value(confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(IntrusionError::UnknownConfidence(confidence));
    }
    Ok(inverse_normal_cdf(1.0 - (1.0 - confidence) / 2.0))
}

pub fn z_test(
    samples: &[f64],
    observed: f64,
    confidence: f64,
    method: SampleMethod,
) -> Result<ZTestReport> {
    let critical = critical_value(confidence)?;
    let (sample_mean, variance) = mean_variance(samples);

    let std_error = if samples.is_empty() {
        0.0
    } else {
        variance.sqrt() / (samples.len() as f64).sqrt()
    };

    // Zero spread, or no samples at all, fails the test
    let z = if std_error > 0.0 {
        (observed - sample_mean).abs() / std_error
    } else {
        f64::INFINITY
    };

    Ok(ZTestReport {
        observed,
        confidence,
        sample_mean,
        variance,
        std_error,
        z,
        critical,
        passed: z < critical,
        samples: samples.len(),
        method,
    })
}

/// Acklam's rational approximation of the standard normal quantile
///
/// Relative error below 1.15e-9 over the open unit interval.
pub fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_values_match_table() {
        let table = [(0.75, 1.15), (0.90, 1.64), (0.95, 1.96), (0.99, 2.57)];
        for (confidence, expected) in table {
            let critical = critical_value(confidence).unwrap();
            assert!(
                (critical - expected).abs() < 0.01,
                "{} -> {}",
                confidence,
                critical
            );
        }
    }

    #[test]
    fn test_inverse_normal_is_symmetric() {
        assert!(inverse_normal_cdf(0.5).abs() < 1e-9);
        assert!((inverse_normal_cdf(0.01) + inverse_normal_cdf(0.99)).abs() < 1e-9);
        assert!((inverse_normal_cdf(0.975) - 1.959_963_985).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_confidence() {
        assert!(matches!(
            critical_value(1.0),
            Err(IntrusionError::UnknownConfidence(_))
        ));
        assert!(critical_value(0.0).is_err());
    }

    #[test]
    fn test_population_variance() {
        let (mean, variance) = mean_variance(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(mean, 2.5);
        assert_eq!(variance, 1.25);
    }

    #[test]
    fn test_z_test_passes_close_mean() {
        let samples = [0.4, 0.5, 0.6, 0.5, 0.45, 0.55];
        let report = z_test(&samples, 0.5, 0.95, SampleMethod::Trials).unwrap();
        assert!(report.passed);
        assert_eq!(report.samples, 6);
        assert!(report.z < 1e-9);
    }

    #[test]
    fn test_z_test_rejects_far_mean() {
        let samples = [0.4, 0.5, 0.6, 0.5, 0.45, 0.55];
        let report = z_test(&samples, 0.9, 0.95, SampleMethod::Trials).unwrap();
        assert!(!report.passed);
    }

    #[test]
    fn test_zero_spread_gives_infinite_z() {
        let report = z_test(&[0.3, 0.3, 0.3], 0.5, 0.75, SampleMethod::Batches).unwrap();
        assert_eq!(report.std_error, 0.0);
        assert!(report.z.is_infinite());
        assert!(!report.passed);

        let report = z_test(&[0.3, 0.3, 0.3], 0.3, 0.75, SampleMethod::Trials).unwrap();
        assert!(report.z.is_infinite());
        assert!(!report.passed);

        let report = z_test(&[], 0.0, 0.75, SampleMethod::Trials).unwrap();
        assert_eq!(report.samples, 0);
        assert!(report.z.is_infinite());
        assert!(!report.passed);
    }
}
