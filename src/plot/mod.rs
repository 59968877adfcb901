//! Display requests and renderers.
//!
//! Fitting code never draws. It describes figures as [`DisplayRequest`]s
//! (built here) and a caller picks a [`Renderer`]:
//!
//! - [`ascii::AsciiRenderer`]: fixed-size character grid for terminals and tests
//! - [`svg::SvgRenderer`]: SVG files via Plotters
//! - `tui::run`: interactive viewer over a list of requests

use crate::arrays::sort_parallel_arrays;
use crate::domain::{DisplayRequest, FitResult, LegendLocation, Series, SeriesColor};
use crate::error::{AppError, ProcessError};
use crate::fit::PolyFit;

pub mod ascii;
pub mod svg;

pub use ascii::{AsciiRenderer, render_ascii};
pub use svg::SvgRenderer;

/// Something that can show a [`DisplayRequest`].
pub trait Renderer {
    fn render(&mut self, request: &DisplayRequest) -> Result<(), AppError>;

    fn render_all(&mut self, requests: &[DisplayRequest]) -> Result<(), AppError> {
        for r in requests {
            self.render(r)?;
        }
        Ok(())
    }
}

/// Points drawn on the polynomial curve.
const CURVE_SAMPLES: usize = 1000;

fn r2_title(r_squared: f64) -> String {
    format!("R² = {r_squared:.5}")
}

/// Figures describing a nonlinear fit.
///
/// - "fit vs x": only with exactly one independent variable. Raw data,
///   the fit, and `true_values` when known.
/// - "fit vs observed": always. Fitted against observed values with the
///   ideal `y = x` line; useful when there are several independent variables.
pub fn fit_displays(
    x: &[Vec<f64>],
    y: &[f64],
    fit: &FitResult,
    true_values: Option<&[f64]>,
) -> Result<Vec<DisplayRequest>, ProcessError> {
    if y.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    if fit.fitted.len() != y.len() {
        return Err(ProcessError::LengthMismatch {
            expected: y.len(),
            found: fit.fitted.len(),
        });
    }

    let title = r2_title(fit.r_squared);
    let mut out = Vec::with_capacity(2);

    if let [x0] = x {
        let mut columns = vec![x0.clone(), y.to_vec(), fit.fitted.clone()];
        if let Some(t) = true_values {
            columns.push(t.to_vec());
        }
        // Sorted by x so the line series draw left to right.
        let sorted = sort_parallel_arrays(&columns, 0)?;

        let mut req = DisplayRequest::new(title.clone(), "x", "y");
        req.push(
            Series::points("raw data", sorted[0].clone(), sorted[1].clone())
                .with_color(SeriesColor::Blue)
                .with_alpha(0.3),
        );
        req.push(Series::line("fit", sorted[0].clone(), sorted[2].clone()).with_color(SeriesColor::Red));
        if let Some(t) = sorted.get(3) {
            req.push(Series::line("true solution", sorted[0].clone(), t.clone()).with_color(SeriesColor::Black));
        }
        out.push(req);
    }

    let (lo, hi) = y
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let mut req = DisplayRequest::new(title, "raw data", "fit data");
    req.push(
        Series::points("actual fit", y.to_vec(), fit.fitted.clone())
            .with_color(SeriesColor::Blue)
            .with_alpha(0.3),
    );
    if lo.is_finite() {
        req.push(Series::line("ideal fit line", vec![lo, hi], vec![lo, hi]).with_color(SeriesColor::Red));
    }
    req.equal_aspect = true;
    req.legend = LegendLocation::UpperLeft;
    out.push(req);

    Ok(out)
}

/// Raw data plus the fitted polynomial sampled densely over `[min x, max x]`.
pub fn poly_display(x: &[f64], y: &[f64], fit: &PolyFit) -> DisplayRequest {
    let (lo, hi) = x
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    let mut req = DisplayRequest::new(format!("{} order polynomial fit", fit.order), "x", "y");
    req.push(Series::points("raw data", x.to_vec(), y.to_vec()).with_alpha(0.15));
    if lo.is_finite() {
        let xs = linspace(lo, hi, CURVE_SAMPLES);
        let ys = xs.iter().map(|&v| fit.evaluate(v)).collect();
        req.push(Series::line(format!("poly fit order {}", fit.order), xs, ys));
    }
    req
}

fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![a];
    }
    (0..n).map(|i| a + (b - a) * i as f64 / (n - 1) as f64).collect()
}
