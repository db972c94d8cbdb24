//! Deterministic random number streams
//!
//! Every trial gets a seed derived from the run's master seed, and every
//! entity built for that trial draws from its own ChaCha stream of that seed.
//! Entities therefore never share a sequence, and a trial can be replayed in
//! isolation (or on another rayon worker) from its seed alone.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal, Triangular};

use crate::core::config::Site;
use crate::core::types::{Tick, Vec2};

/// Seed for trial `trial` of a run started with `master_seed`
pub fn trial_seed(master_seed: u64, trial: u64) -> u64 {
    master_seed ^ trial.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

/// Hands out one independent stream per entity of a trial
#[derive(Debug, Clone)]
pub struct RngStreams {
    seed: u64,
    next_stream: u64,
}

impl RngStreams {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            next_stream: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Next unused stream of this trial's seed
    pub fn next_stream(&mut self) -> EntityRng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        rng.set_stream(self.next_stream);
        self.next_stream += 1;
        EntityRng { inner: rng }
    }
}

/// Sampling primitives used by entity timers and movement
#[derive(Debug, Clone)]
pub struct EntityRng {
    inner: ChaCha8Rng,
}

impl EntityRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform draw in `[0, 1)`
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform draw between `a` and `b` (order-insensitive)
    ///
    /// Degenerate or non-finite ranges return the lower bound without drawing.
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let span = hi - lo;
        if !span.is_finite() || span <= f64::EPSILON {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// Triangular draw on `[low, high]` peaking at `mode`
    pub fn triangular(&mut self, low: f64, mode: f64, high: f64) -> f64 {
        if high - low <= f64::EPSILON {
            return low;
        }
        let mode = mode.clamp(low, high);
        match Triangular::new(low, high, mode) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mode,
        }
    }

    /// Gaussian draw; a non-positive spread returns the mean
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return mean;
        }
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mean,
        }
    }

    /// Bernoulli trial: true with probability `p`
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform index in `0..len`; `len` must be non-zero
    pub fn index(&mut self, len: usize) -> usize {
        self.inner.gen_range(0..len)
    }

    /// Uniform duration between two tick bounds, rounded to whole ticks
    pub fn uniform_ticks(&mut self, min: f64, max: f64) -> Tick {
        to_ticks(self.uniform(min, max))
    }

    /// Triangular duration, rounded to whole ticks
    pub fn triangular_ticks(&mut self, low: f64, mode: f64, high: f64) -> Tick {
        to_ticks(self.triangular(low, mode, high))
    }

    /// Gaussian duration, truncated at zero and rounded to whole ticks
    pub fn gaussian_ticks(&mut self, mean: f64, std_dev: f64) -> Tick {
        to_ticks(self.gaussian(mean, std_dev))
    }

    /// Uniform point anywhere on the site
    pub fn point_in(&mut self, site: &Site) -> Vec2 {
        Vec2::new(self.uniform(0.0, site.width), self.uniform(0.0, site.height))
    }

    /// Random unit-square direction, each axis uniform in `[-1, 1)`
    pub fn jitter(&mut self) -> Vec2 {
        Vec2::new(self.uniform(-1.0, 1.0), self.uniform(-1.0, 1.0))
    }
}

fn to_ticks(value: f64) -> Tick {
    if value.is_finite() && value > 0.0 {
        value.round() as Tick
    } else {
        0
    }
}
