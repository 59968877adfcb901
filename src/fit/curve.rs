//! Model + initial guess + data -> fitted parameters.
//!
//! [`CurveFit`] adapts a [`Model`] to a [`LeastSquaresSolver`]:
//!
//! ```text
//! Configured -> Solving -> Converged(report)
//!                       -> Failed(error)
//! ```
//!
//! A successful fit produces a [`FitResult`]: the solver's parameters, the model
//! evaluated at those parameters on the fitted data, and R² against the observed
//! values. Failures are recorded in the state and returned unchanged; retrying
//! with a different guess is up to the caller (see `fit::multistart`).

use tracing::info;

use crate::domain::{Bounds, FitResult, FitState, SolverReport};
use crate::error::ProcessError;
use crate::fit::solver::{LeastSquaresSolver, LevenbergMarquardt};
use crate::fit::stats::r_squared;
use crate::models::{Model, ModelKind};

/// Stateful wrapper around one model/guess pair.
#[derive(Debug)]
pub struct CurveFit<M, S = LevenbergMarquardt> {
    model: M,
    guess: Vec<f64>,
    bounds: Option<Bounds>,
    solver: S,
    state: FitState,
}

impl<M: Model> CurveFit<M, LevenbergMarquardt> {
    /// Configure a fit with the default Levenberg-Marquardt solver.
    pub fn new(model: M, guess: Vec<f64>) -> Self {
        Self {
            model,
            guess,
            bounds: None,
            solver: LevenbergMarquardt::default(),
            state: FitState::Configured,
        }
    }
}

impl<M: Model, S: LeastSquaresSolver> CurveFit<M, S> {
    /// Swap the solver (e.g. to change iteration caps or plug in another minimizer).
    pub fn with_solver<T: LeastSquaresSolver>(self, solver: T) -> CurveFit<M, T> {
        CurveFit {
            model: self.model,
            guess: self.guess,
            bounds: self.bounds,
            solver,
            state: FitState::Configured,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn state(&self) -> &FitState {
        &self.state
    }

    pub fn guess(&self) -> &[f64] {
        &self.guess
    }

    /// Solver report of the last successful fit.
    pub fn report(&self) -> Option<&SolverReport> {
        match &self.state {
            FitState::Converged(report) => Some(report),
            _ => None,
        }
    }

    /// Fit the model to `y` observed at the independent data `x`.
    ///
    /// `x` holds one array per independent variable, each as long as `y`.
    /// May be called again; every call starts from the configured guess.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<FitResult, ProcessError> {
        self.state = FitState::Solving;
        match solve_fit(&self.model, &self.solver, &self.guess, self.bounds.as_ref(), x, y) {
            Ok((result, report)) => {
                self.state = FitState::Converged(report);
                Ok(result)
            }
            Err(err) => {
                self.state = FitState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Replace the guess and fit again, whatever the previous outcome.
    pub fn refit(&mut self, guess: Vec<f64>, x: &[Vec<f64>], y: &[f64]) -> Result<FitResult, ProcessError> {
        self.guess = guess;
        self.state = FitState::Configured;
        self.fit(x, y)
    }
}

/// Validate, solve, then evaluate the fit. Shared by `CurveFit` and multi-start.
pub(crate) fn solve_fit<M, S>(
    model: &M,
    solver: &S,
    guess: &[f64],
    bounds: Option<&Bounds>,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<(FitResult, SolverReport), ProcessError>
where
    M: Model + ?Sized,
    S: LeastSquaresSolver + ?Sized,
{
    if guess.is_empty() {
        return Err(ProcessError::InvalidArgument("initial guess is empty".to_string()));
    }
    if x.is_empty() || y.is_empty() {
        return Err(ProcessError::EmptyInput);
    }
    for xs in x {
        if xs.len() != y.len() {
            return Err(ProcessError::LengthMismatch {
                expected: y.len(),
                found: xs.len(),
            });
        }
    }
    if let Some(expected) = model.param_count() {
        if guess.len() != expected {
            return Err(ProcessError::LengthMismatch {
                expected,
                found: guess.len(),
            });
        }
    }
    if let Some(b) = bounds {
        b.validate(guess)?;
    }

    let probe = model.predict(x, guess);
    if probe.len() != y.len() {
        return Err(ProcessError::LengthMismatch {
            expected: y.len(),
            found: probe.len(),
        });
    }

    let residual = |p: &[f64]| -> Vec<f64> {
        model
            .predict(x, p)
            .iter()
            .zip(y)
            .map(|(f, obs)| f - obs)
            .collect()
    };
    let report = solver.minimize(&residual, guess, bounds)?;

    let fitted = model.predict(x, &report.params);
    let r2 = r_squared(y, &fitted)?;
    info!(
        r_squared = r2,
        params = ?report.params,
        iterations = report.iterations,
        "fit converged"
    );

    Ok((
        FitResult {
            params: report.params.clone(),
            fitted,
            r_squared: r2,
        },
        report,
    ))
}

/// Fit one of the built-in single-variable models.
///
/// `guess = None` starts from `kind.default_guess()`.
pub fn fit_builtin(kind: ModelKind, x: &[f64], y: &[f64], guess: Option<Vec<f64>>) -> Result<FitResult, ProcessError> {
    let guess = guess.unwrap_or_else(|| kind.default_guess());
    if guess.len() != kind.param_count() {
        return Err(ProcessError::LengthMismatch {
            expected: kind.param_count(),
            found: guess.len(),
        });
    }
    CurveFit::new(kind, guess).fit(&[x.to_vec()], y)
}

/// Exponential fit `a·exp(x/b) + c`. Default guess `[1, 1, 1]`.
pub fn exp_fit(x: &[f64], y: &[f64], guess: Option<Vec<f64>>) -> Result<FitResult, ProcessError> {
    fit_builtin(ModelKind::Exponential, x, y, guess)
}

/// Cosine fit `a·cos(2π·d·x + b) + c`, guess `[a, b, c, d]`.
///
/// Cosine fits are sensitive to the starting frequency `d`; a guess far from the
/// true frequency usually lands in a local minimum.
pub fn cos_fit(x: &[f64], y: &[f64], guess: Vec<f64>) -> Result<FitResult, ProcessError> {
    fit_builtin(ModelKind::Cosine, x, y, Some(guess))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SolverOptions;

    fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| a + (b - a) * i as f64 / (n as f64 - 1.0)).collect()
    }

    #[test]
    fn exponential_fit_recovers_parameters() {
        let x = linspace(-1.0, 1.0, 100);
        let y: Vec<f64> = x
            .iter()
            .map(|v| 1.0 + std::f64::consts::PI * (v / std::f64::consts::SQRT_2).exp())
            .collect();

        let fit = exp_fit(&x, &y, None).unwrap();
        assert!((fit.params[0] - std::f64::consts::PI).abs() < 1e-4, "{:?}", fit.params);
        assert!((fit.params[1] - std::f64::consts::SQRT_2).abs() < 1e-4, "{:?}", fit.params);
        assert!((fit.params[2] - 1.0).abs() < 1e-4, "{:?}", fit.params);
        assert_eq!(fit.fitted.len(), x.len());
        assert!(fit.r_squared > 0.999_999);
    }

    #[test]
    fn cosine_fit_with_close_guess() {
        let x = linspace(0.0, 2.0 * std::f64::consts::PI, 48);
        let truth = [2.5, 0.4, 10.0, 0.3];
        let y: Vec<f64> = x.iter().map(|&v| ModelKind::Cosine.eval(v, &truth)).collect();

        let fit = cos_fit(&x, &y, vec![2.0, 0.0, 10.0, 0.3]).unwrap();
        for (a, b) in fit.params.iter().zip(truth) {
            assert!((a - b).abs() < 1e-4, "{:?}", fit.params);
        }
    }

    #[test]
    fn multivariable_closure_model() {
        // z = ln(a) + b ln(x) + c ln(y)
        let x1 = linspace(0.1, 1.1, 101);
        let x2 = linspace(1.0, 2.0, 101);
        let model = |v: &[Vec<f64>], p: &[f64]| -> Vec<f64> {
            v[0].iter()
                .zip(&v[1])
                .map(|(a, b)| p[0].ln() + p[1] * a.ln() + p[2] * b.ln())
                .collect()
        };
        let data = vec![x1, x2];
        let z = model(&data, &[10.0, 4.0, 6.0]);

        let mut fit = CurveFit::new(model, vec![8.0, 2.0, 7.0]);
        assert_eq!(fit.state(), &FitState::Configured);
        let result = fit.fit(&data, &z).unwrap();
        assert!((result.params[0] - 10.0).abs() < 1e-3, "{:?}", result.params);
        assert!((result.params[1] - 4.0).abs() < 1e-4);
        assert!((result.params[2] - 6.0).abs() < 1e-4);
        assert!(matches!(fit.state(), FitState::Converged(_)));
        assert!(fit.report().is_some());
    }

    #[test]
    fn failure_is_recorded_in_state() {
        // exp(x / 0) is not finite at the guess.
        let x = linspace(0.5, 1.0, 10);
        let y = vec![1.0; 10];
        let mut fit = CurveFit::new(ModelKind::Exponential, vec![1.0, 0.0, 0.0]);
        let err = fit.fit(&[x.clone()], &y).unwrap_err();
        assert!(matches!(err, ProcessError::Convergence { .. }));
        assert_eq!(fit.state(), &FitState::Failed(err));
        assert!(fit.report().is_none());

        let y: Vec<f64> = x.iter().map(|v| 2.0 * (v / 0.5).exp() + 1.0).collect();
        let result = fit.refit(vec![1.5, 0.6, 0.5], &[x], &y).unwrap();
        assert!(result.r_squared > 0.999_999);
        assert!(fit.report().is_some());
    }

    #[test]
    fn iteration_cap_surfaces_as_convergence_error() {
        let x = linspace(0.0, 3.0, 30);
        let y: Vec<f64> = x.iter().map(|v| 5.0 * (v / 0.7).exp() - 2.0).collect();
        let solver = LevenbergMarquardt::new(SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        });
        let mut fit = CurveFit::new(ModelKind::Exponential, vec![1.0, 3.0, 0.0]).with_solver(solver);
        assert!(matches!(fit.fit(&[x], &y), Err(ProcessError::Convergence { .. })));
    }

    #[test]
    fn input_validation() {
        let mut fit = CurveFit::new(ModelKind::Power, vec![1.0, 1.0, 0.0]);
        assert_eq!(fit.fit(&[], &[1.0]), Err(ProcessError::EmptyInput));
        assert_eq!(
            fit.fit(&[vec![1.0, 2.0]], &[1.0]),
            Err(ProcessError::LengthMismatch { expected: 1, found: 2 })
        );
        assert!(matches!(
            exp_fit(&[1.0, 2.0], &[1.0, 2.0], Some(vec![1.0])),
            Err(ProcessError::LengthMismatch { expected: 3, found: 1 })
        ));
    }

    #[test]
    fn short_guess_for_builtin_model_is_an_error() {
        let x = vec![vec![0.0, 1.0, 2.0]];
        let y = [1.0, 2.0, 4.0];
        let mut fit = CurveFit::new(ModelKind::Exponential, vec![1.0]);
        let err = fit.fit(&x, &y).unwrap_err();
        assert_eq!(err, ProcessError::LengthMismatch { expected: 3, found: 1 });
        assert_eq!(fit.state(), &FitState::Failed(err));
    }

    #[test]
    fn bounded_fit_stays_in_box() {
        let x = linspace(1.0, 4.0, 20);
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v.powf(1.5) + 1.0).collect();
        let bounds = Bounds::new(vec![0.0, 0.0, -10.0], vec![10.0, 1.2, 10.0]);
        let mut fit = CurveFit::new(ModelKind::Power, vec![1.0, 1.0, 0.0]).with_bounds(bounds);
        let result = fit.fit(&[x], &y).unwrap();
        assert!(result.params[1] <= 1.2 + 1e-12);
        assert!(result.r_squared < 1.0);
    }

    #[test]
    fn constant_observations_are_degenerate() {
        let x = linspace(0.0, 1.0, 10);
        let y = vec![3.0; 10];
        let err = fit_builtin(ModelKind::Power, &x, &y, Some(vec![0.0, 1.0, 3.0])).unwrap_err();
        assert_eq!(err, ProcessError::DegenerateFit);
    }
}
