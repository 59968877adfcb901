//! Shared fit pipeline used by `dp fit` and `dp demo`.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! table -> columns -> complete rows -> fit (single or multi-start) -> figures
//!
//! The front-ends then only handle presentation and exports.

use tracing::{info, warn};

use crate::domain::{DisplayRequest, FitConfig, FitResult, ModelSpec, SolverReport};
use crate::error::AppError;
use crate::fit::{CurveFit, LevenbergMarquardt, PolyFit, fit_multi_start, jitter_guesses, poly_fit};
use crate::io::ColumnTable;
use crate::models::ModelKind;
use crate::plot::{fit_displays, poly_display};

/// Relative spread of the jittered starting points.
const JITTER_SCALE: f64 = 0.5;

/// All computed outputs of a single fit run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Model label for reports and exports.
    pub model: String,
    pub result: FitResult,
    /// `None` for polynomial fits (no iterative solver).
    pub report: Option<SolverReport>,
    pub poly: Option<PolyFit>,
    pub starts: usize,
    pub failed_starts: usize,
    pub displays: Vec<DisplayRequest>,
}

/// Observations ready to fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitData {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<f64>,
    pub y_true: Option<Vec<f64>>,
}

/// Read the configured columns and fit them.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let table = ColumnTable::read_csv(&config.input)?;
    let data = select_columns(&table, config)?;
    fit_data(config, &data)
}

/// Pull the x/y/true columns out of `table`, dropping rows with NaN in any of them.
pub fn select_columns(table: &ColumnTable, config: &FitConfig) -> Result<FitData, AppError> {
    let x: Vec<&[f64]> = config
        .x_columns
        .iter()
        .map(|c| table.column(c))
        .collect::<Result<_, _>>()?;
    let y = table.column(&config.y_column)?;
    let y_true = config.true_column.as_deref().map(|c| table.column(c)).transpose()?;

    let keep: Vec<usize> = (0..y.len())
        .filter(|&i| {
            !y[i].is_nan() && x.iter().all(|c| !c[i].is_nan()) && y_true.is_none_or(|t| !t[i].is_nan())
        })
        .collect();
    let dropped = y.len() - keep.len();
    if dropped > 0 {
        warn!(dropped, "rows with NaN skipped");
    }
    if keep.is_empty() {
        return Err(AppError::new(3, "No complete rows to fit."));
    }

    let pick = |col: &[f64]| -> Vec<f64> { keep.iter().map(|&i| col[i]).collect() };
    Ok(FitData {
        x: x.iter().map(|c| pick(c)).collect(),
        y: pick(y),
        y_true: y_true.map(pick),
    })
}

pub fn builtin_kind(spec: ModelSpec) -> Option<ModelKind> {
    match spec {
        ModelSpec::Exp => Some(ModelKind::Exponential),
        ModelSpec::Cos => Some(ModelKind::Cosine),
        ModelSpec::Power => Some(ModelKind::Power),
        ModelSpec::Poly => None,
    }
}

/// Fit `data` per `config` and build the figures.
pub fn fit_data(config: &FitConfig, data: &FitData) -> Result<RunOutput, AppError> {
    let Some(kind) = builtin_kind(config.model) else {
        return fit_poly(config, data);
    };
    if data.x.len() != 1 {
        return Err(AppError::new(
            2,
            format!("Model '{}' takes one x column, got {}", kind.display_name(), data.x.len()),
        ));
    }

    let guess = config.guess.clone().unwrap_or_else(|| kind.default_guess());
    if guess.len() != kind.param_count() {
        return Err(AppError::new(
            2,
            format!(
                "Model '{}' takes {} parameters, guess has {}",
                kind.display_name(),
                kind.param_count(),
                guess.len()
            ),
        ));
    }
    let solver = LevenbergMarquardt::new(config.solver.clone());

    let (result, report, starts, failed_starts) = if config.starts > 0 {
        let guesses = jitter_guesses(&guess, config.starts, JITTER_SCALE, config.seed, config.bounds.as_ref())?;
        let best = fit_multi_start(&kind, &solver, &guesses, config.bounds.as_ref(), &data.x, &data.y)?;
        info!(best_start = best.best_index, "multi-start fit selected");
        (best.result, best.report, guesses.len(), best.failures.len())
    } else {
        let mut fit = CurveFit::new(kind, guess).with_solver(solver);
        if let Some(b) = &config.bounds {
            fit = fit.with_bounds(b.clone());
        }
        let result = fit.fit(&data.x, &data.y)?;
        let report = fit.report().cloned().ok_or_else(|| AppError::new(4, "Fit finished without a report."))?;
        (result, report, 1, 0)
    };

    let displays = fit_displays(&data.x, &data.y, &result, data.y_true.as_deref())?;
    Ok(RunOutput {
        model: kind.display_name().to_string(),
        result,
        report: Some(report),
        poly: None,
        starts,
        failed_starts,
        displays,
    })
}

fn fit_poly(config: &FitConfig, data: &FitData) -> Result<RunOutput, AppError> {
    let [x] = data.x.as_slice() else {
        return Err(AppError::new(
            2,
            format!("Polynomial fits take one x column, got {}", data.x.len()),
        ));
    };
    let fit = poly_fit(x, &data.y, config.order)?;
    let displays = vec![poly_display(x, &data.y, &fit)];
    Ok(RunOutput {
        model: format!("polynomial order {}", fit.order),
        result: FitResult {
            params: fit.coefs.clone(),
            fitted: fit.fitted.clone(),
            r_squared: fit.r_squared,
        },
        report: None,
        poly: Some(fit),
        starts: 1,
        failed_starts: 0,
        displays,
    })
}
