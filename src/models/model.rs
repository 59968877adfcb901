//! The `Model` trait and the built-in exponential / cosine / power models.
//!
//! Independent data is a parallel array set: `x[0]` is the first independent
//! variable, `x[1]` the second, and so on. Built-in models read `x[0]` only.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// Something that can be fit: `predict(x, params) -> y`.
///
/// The returned vector must have one entry per row of `x`.
pub trait Model: Sync {
    fn predict(&self, x: &[Vec<f64>], params: &[f64]) -> Vec<f64>;

    /// Number of parameters `predict` reads, when fixed. Closures report `None`.
    fn param_count(&self) -> Option<usize> {
        None
    }
}

impl<F> Model for F
where
    F: Fn(&[Vec<f64>], &[f64]) -> Vec<f64> + Sync,
{
    fn predict(&self, x: &[Vec<f64>], params: &[f64]) -> Vec<f64> {
        self(x, params)
    }
}

/// Built-in single-variable models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// `a·exp(x/b) + c`, params `[a, b, c]`.
    Exponential,
    /// `a·cos(2π·d·x + b) + c`, params `[a, b, c, d]`.
    Cosine,
    /// `a·x^b + c`, params `[a, b, c]`.
    Power,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "a*exp(x/b)+c",
            ModelKind::Cosine => "a*cos(2*pi*d*x+b)+c",
            ModelKind::Power => "a*x^b+c",
        }
    }

    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Exponential | ModelKind::Power => 3,
            ModelKind::Cosine => 4,
        }
    }

    /// Starting point used when the caller gives no guess.
    pub fn default_guess(self) -> Vec<f64> {
        match self {
            ModelKind::Exponential => vec![1.0, 1.0, 1.0],
            ModelKind::Cosine => vec![1.0, 0.0, 0.0, 1.0],
            ModelKind::Power => vec![1.0, 1.0, 0.0],
        }
    }

    /// Evaluate the model at a single `x`.
    pub fn eval(self, x: f64, p: &[f64]) -> f64 {
        match self {
            ModelKind::Exponential => p[0] * (x / p[1]).exp() + p[2],
            ModelKind::Cosine => p[0] * (x * p[3] * TAU + p[1]).cos() + p[2],
            ModelKind::Power => p[0] * x.powf(p[1]) + p[2],
        }
    }
}

impl Model for ModelKind {
    /// # Panics
    /// Panics if `x` is empty or `params` is shorter than `param_count()`.
    /// `CurveFit` and `fit_multi_start` reject both before solving.
    fn predict(&self, x: &[Vec<f64>], params: &[f64]) -> Vec<f64> {
        x[0].iter().map(|&xi| self.eval(xi, params)).collect()
    }

    fn param_count(&self) -> Option<usize> {
        Some(ModelKind::param_count(*self))
    }
}
