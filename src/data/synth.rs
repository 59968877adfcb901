//! Seeded synthetic samples from the built-in models.
//!
//! `x` is evenly spaced over the requested range, `y_true` is the exact model
//! value and `y` adds Gaussian noise. The same seed always gives the same
//! sample.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::error::ProcessError;
use crate::models::ModelKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub x: Vec<f64>,
    /// Noisy observations.
    pub y: Vec<f64>,
    /// Noise-free model values.
    pub y_true: Vec<f64>,
}

/// Sample `kind` with `params` at `n` points over `x_range`.
pub fn generate(
    kind: ModelKind,
    params: &[f64],
    x_range: (f64, f64),
    n: usize,
    noise_sigma: f64,
    seed: u64,
) -> Result<Sample, ProcessError> {
    if params.len() != kind.param_count() {
        return Err(ProcessError::LengthMismatch {
            expected: kind.param_count(),
            found: params.len(),
        });
    }
    if n < 2 {
        return Err(ProcessError::InvalidArgument(format!("sample needs at least 2 points, got {n}")));
    }
    let (lo, hi) = x_range;
    if !(lo.is_finite() && hi.is_finite() && hi > lo) {
        return Err(ProcessError::InvalidArgument(format!("invalid x range [{lo}, {hi}]")));
    }
    // rand_distr accepts a negative sigma (it mirrors the distribution).
    if !(noise_sigma.is_finite() && noise_sigma >= 0.0) {
        return Err(ProcessError::InvalidArgument(format!(
            "noise sigma must be finite and >= 0, got {noise_sigma}"
        )));
    }
    let normal = Normal::new(0.0, noise_sigma)
        .map_err(|e| ProcessError::InvalidArgument(format!("noise sigma {noise_sigma}: {e}")))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let x: Vec<f64> = (0..n).map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64).collect();
    let y_true: Vec<f64> = x.iter().map(|&v| kind.eval(v, params)).collect();
    let y = y_true.iter().map(|&v| v + normal.sample(&mut rng)).collect();
    debug!(model = kind.display_name(), n, noise_sigma, seed, "generated sample");

    Ok(Sample { x, y, y_true })
}

/// What `dp demo` samples and where its fit starts.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoSetup {
    pub params: Vec<f64>,
    pub x_range: (f64, f64),
    pub guess: Vec<f64>,
}

pub fn demo_setup(kind: ModelKind) -> DemoSetup {
    use std::f64::consts::{PI, SQRT_2, TAU};
    match kind {
        ModelKind::Exponential => DemoSetup {
            params: vec![PI, SQRT_2, 1.0],
            x_range: (-1.0, 1.0),
            guess: kind.default_guess(),
        },
        // Cosine fits need a frequency guess near the truth.
        ModelKind::Cosine => DemoSetup {
            params: vec![2.5, 0.4, 10.0, 0.3],
            x_range: (0.0, TAU),
            guess: vec![2.0, 0.0, 10.0, 0.3],
        },
        ModelKind::Power => DemoSetup {
            params: vec![2.0, 1.5, 1.0],
            x_range: (0.5, 4.0),
            guess: kind.default_guess(),
        },
    }
}
