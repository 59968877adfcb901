//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - reloaded later for plotting

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProcessError;

/// Result of a single fit.
///
/// `fitted` is aligned index-for-index with the independent data that was fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub params: Vec<f64>,
    pub fitted: Vec<f64>,
    pub r_squared: f64,
}

/// What the least-squares solver reports back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    pub params: Vec<f64>,
    /// `0.5 * Σ r²` at `params`.
    pub cost: f64,
    pub iterations: usize,
    /// Residual function evaluations, Jacobian columns included.
    pub evaluations: usize,
}

/// Lifecycle of a curve-fit wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum FitState {
    Configured,
    Solving,
    Converged(SolverReport),
    Failed(ProcessError),
}

/// Per-parameter box constraints. Infinite entries mean "unbounded".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self { lower, upper }
    }

    /// Check shape against `n_params` and that `guess` is feasible.
    pub fn validate(&self, guess: &[f64]) -> Result<(), ProcessError> {
        let n = guess.len();
        for side in [&self.lower, &self.upper] {
            if side.len() != n {
                return Err(ProcessError::LengthMismatch {
                    expected: n,
                    found: side.len(),
                });
            }
        }
        for i in 0..n {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ProcessError::InvalidArgument(format!(
                    "bounds for parameter {i} are invalid: [{lo}, {hi}]"
                )));
            }
            if !(lo..=hi).contains(&guess[i]) {
                return Err(ProcessError::InvalidArgument(format!(
                    "initial guess for parameter {i} ({}) lies outside [{lo}, {hi}]",
                    guess[i]
                )));
            }
        }
        Ok(())
    }

    /// Clamp `params` into the box in place.
    pub fn project(&self, params: &mut [f64]) {
        for (i, p) in params.iter_mut().enumerate() {
            *p = p.clamp(self.lower[i], self.upper[i]);
        }
    }
}

/// Stopping rules for the nonlinear least-squares solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Hard cap on accepted-or-rejected LM iterations.
    pub max_iterations: usize,
    /// Relative cost reduction below which the fit is considered converged.
    pub ftol: f64,
    /// Relative step size below which the fit is considered converged.
    pub xtol: f64,
    /// Gradient infinity-norm below which the fit is considered converged.
    pub gtol: f64,
    /// Starting Levenberg-Marquardt damping factor.
    pub initial_damping: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
            initial_damping: 1e-3,
        }
    }
}

/// Which model the `fit` command uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    /// `a·exp(x/b) + c`
    Exp,
    /// `a·cos(2π·d·x + b) + c`
    Cos,
    /// `a·x^b + c`
    Power,
    /// Polynomial of `--order` (linear least squares).
    Poly,
}

/// Marker drawn at each data point of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marker {
    None,
    Point,
}

/// Line drawn between consecutive points of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    None,
    Solid,
    Dashed,
}

/// Series color (a small fixed palette every renderer can map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesColor {
    Blue,
    Red,
    Black,
    Green,
}

impl SeriesColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            SeriesColor::Blue => (31, 119, 180),
            SeriesColor::Red => (214, 39, 40),
            SeriesColor::Black => (0, 0, 0),
            SeriesColor::Green => (44, 160, 44),
        }
    }
}

/// Where the legend goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendLocation {
    #[default]
    Best,
    UpperLeft,
}

/// One labeled `(x, y)` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    #[serde(deserialize_with = "nan_from_null")]
    pub x: Vec<f64>,
    #[serde(deserialize_with = "nan_from_null")]
    pub y: Vec<f64>,
    pub marker: Marker,
    pub line: LineStyle,
    pub color: Option<SeriesColor>,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
}

impl Series {
    /// Scatter series (point markers, no line).
    pub fn points(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            marker: Marker::Point,
            line: LineStyle::None,
            color: None,
            alpha: 1.0,
        }
    }

    /// Line series (solid line, no markers).
    pub fn line(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            marker: Marker::None,
            line: LineStyle::Solid,
            color: None,
            alpha: 1.0,
        }
    }

    pub fn with_color(mut self, color: SeriesColor) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_line(mut self, line: LineStyle) -> Self {
        self.line = line;
        self
    }

    /// Finite `(x, y)` pairs, in order.
    pub fn finite_pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x
            .iter()
            .zip(self.y.iter())
            .map(|(&x, &y)| (x, y))
            .filter(|(x, y)| x.is_finite() && y.is_finite())
    }
}

/// JSON has no NaN; serde_json writes it as `null`. Read it back as NaN.
fn nan_from_null<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
    let raw: Vec<Option<f64>> = Vec::deserialize(d)?;
    Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

/// Everything a renderer needs to draw one figure.
///
/// Fits never render anything themselves; they hand these to a
/// [`crate::plot::Renderer`] chosen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayRequest {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    #[serde(default)]
    pub equal_aspect: bool,
    #[serde(default)]
    pub legend: LegendLocation,
    /// Optional file the figure should be saved to.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
}

impl DisplayRequest {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series: Vec::new(),
            equal_aspect: false,
            legend: LegendLocation::Best,
            save_path: None,
        }
    }

    pub fn push(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Bounding box over all finite points: `([x_min, x_max], [y_min, y_max])`.
    pub fn bounds(&self) -> Option<([f64; 2], [f64; 2])> {
        let mut x = [f64::INFINITY, f64::NEG_INFINITY];
        let mut y = [f64::INFINITY, f64::NEG_INFINITY];
        for s in &self.series {
            for (px, py) in s.finite_pairs() {
                x[0] = x[0].min(px);
                x[1] = x[1].max(px);
                y[0] = y[0].min(py);
                y[1] = y[1].max(py);
            }
        }
        if x[0].is_finite() && y[0].is_finite() {
            Some((x, y))
        } else {
            None
        }
    }
}

/// A `dp fit` run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub input: PathBuf,
    pub x_columns: Vec<String>,
    pub y_column: String,
    pub true_column: Option<String>,

    pub model: ModelSpec,
    /// Initial guess; `None` uses the model's default guess.
    pub guess: Option<Vec<f64>>,
    pub order: usize,
    pub bounds: Option<Bounds>,
    pub solver: SolverOptions,

    /// Number of extra jittered starting points (0 = single start).
    pub starts: usize,
    pub seed: u64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub svg_dir: Option<PathBuf>,
    pub export_fit: Option<PathBuf>,
    pub export_display: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_validate_shape_and_feasibility() {
        let b = Bounds::new(vec![0.0, f64::NEG_INFINITY], vec![1.0, f64::INFINITY]);
        assert!(b.validate(&[0.5, -1e9]).is_ok());
        assert!(matches!(b.validate(&[2.0, 0.0]), Err(ProcessError::InvalidArgument(_))));
        assert_eq!(
            b.validate(&[0.5]),
            Err(ProcessError::LengthMismatch { expected: 1, found: 2 })
        );

        let inverted = Bounds::new(vec![1.0], vec![0.0]);
        assert!(matches!(inverted.validate(&[0.5]), Err(ProcessError::InvalidArgument(_))));
    }

    #[test]
    fn project_clamps_into_box() {
        let b = Bounds::new(vec![0.0, 0.0], vec![1.0, 1.0]);
        let mut p = [-3.0, 0.25];
        b.project(&mut p);
        assert_eq!(p, [0.0, 0.25]);
    }

    #[test]
    fn display_bounds_skip_non_finite() {
        let mut req = DisplayRequest::new("t", "x", "y");
        req.push(Series::points("a", vec![0.0, 1.0, f64::NAN], vec![5.0, -1.0, 100.0]));
        assert_eq!(req.bounds(), Some(([0.0, 1.0], [-1.0, 5.0])));
        assert_eq!(DisplayRequest::new("t", "x", "y").bounds(), None);
    }

    #[test]
    fn series_nan_survives_json() {
        let s = Series::points("a", vec![1.0, f64::NAN], vec![2.0, 3.0]);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("null"));
        let back: Series = serde_json::from_str(&json).unwrap();
        assert!(back.x[1].is_nan());
        assert_eq!(back.y, vec![2.0, 3.0]);
    }
}
