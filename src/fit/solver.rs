//! Nonlinear least-squares solver.
//!
//! Fitting code talks to the solver through [`LeastSquaresSolver`]: given a
//! residual function and an initial guess, return a parameter vector that
//! locally minimizes `Σ r²`, or fail with `ProcessError::Convergence`.
//!
//! [`LevenbergMarquardt`] is the shipped implementation:
//!
//! - forward-difference Jacobian
//! - each damped step solves the augmented linear least-squares system
//!
//! ```text
//! [ J      ]       [ -r ]
//! [ √λ · D ] δ  ≈  [  0 ]
//! ```
//!
//!   with `D` the Jacobian column norms (Marquardt scaling), via the SVD solver
//!   in `math::ols`
//! - accepted steps shrink `λ`, rejected steps grow it
//! - steps are projected onto the box bounds when given
//! - `max_iterations` caps the work of every call

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::domain::{Bounds, SolverOptions, SolverReport};
use crate::error::ProcessError;
use crate::math::solve_least_squares;

/// Residual function: parameters in, one residual per observation out.
pub type ResidualFn<'a> = dyn Fn(&[f64]) -> Vec<f64> + Sync + 'a;

/// A black-box nonlinear least-squares minimizer.
pub trait LeastSquaresSolver: Sync {
    fn minimize(
        &self,
        residual: &ResidualFn<'_>,
        guess: &[f64],
        bounds: Option<&Bounds>,
    ) -> Result<SolverReport, ProcessError>;
}

const MIN_DAMPING: f64 = 1e-15;
const MAX_DAMPING: f64 = 1e16;
const MIN_SCALE: f64 = 1e-12;

/// Levenberg-Marquardt with Marquardt scaling and box projection.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    options: SolverOptions,
}

impl LevenbergMarquardt {
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }
}

impl LeastSquaresSolver for LevenbergMarquardt {
    fn minimize(
        &self,
        residual: &ResidualFn<'_>,
        guess: &[f64],
        bounds: Option<&Bounds>,
    ) -> Result<SolverReport, ProcessError> {
        if guess.is_empty() {
            return Err(ProcessError::InvalidArgument("initial guess is empty".to_string()));
        }
        if let Some(b) = bounds {
            b.validate(guess)?;
        }
        let opts = &self.options;

        let mut p = guess.to_vec();
        let mut r = residual(&p[..]);
        let mut evaluations = 1usize;
        if r.is_empty() {
            return Err(ProcessError::EmptyInput);
        }
        if r.iter().any(|v| !v.is_finite()) {
            return Err(ProcessError::convergence(
                "residuals are not finite at the initial point",
                guess,
                None,
            ));
        }

        let mut cost = half_sum_sq(&r);
        let mut lambda = opts.initial_damping.max(MIN_DAMPING);
        let mut iterations = 0usize;

        let report = |p: Vec<f64>, cost: f64, iterations: usize, evaluations: usize| {
            debug!(iterations, evaluations, cost, "solver converged");
            SolverReport {
                params: p,
                cost,
                iterations,
                evaluations,
            }
        };

        loop {
            if cost == 0.0 {
                return Ok(report(p, cost, iterations, evaluations));
            }
            if iterations >= opts.max_iterations {
                return Err(ProcessError::convergence(
                    format!(
                        "maximum iterations ({}) reached with cost {cost:.6e}",
                        opts.max_iterations
                    ),
                    guess,
                    None,
                ));
            }
            iterations += 1;

            let jac = jacobian(residual, &p, &r, bounds, &mut evaluations)
                .map_err(|(j, why)| ProcessError::convergence(why, guess, Some(j)))?;
            let rv = DVector::from_column_slice(&r);

            let grad = jac.transpose() * &rv;
            if grad.amax() <= opts.gtol {
                return Ok(report(p, cost, iterations, evaluations));
            }

            let scale: Vec<f64> = jac
                .column_iter()
                .map(|c| c.norm().max(MIN_SCALE))
                .collect();

            // Inner loop: raise the damping until a step lowers the cost.
            loop {
                let Some(step) = damped_step(&jac, &rv, &scale, lambda) else {
                    lambda *= 10.0;
                    if lambda > MAX_DAMPING {
                        return Ok(report(p, cost, iterations, evaluations));
                    }
                    continue;
                };

                let mut trial: Vec<f64> = p.iter().zip(step.iter()).map(|(a, d)| a + d).collect();
                if let Some(b) = bounds {
                    b.project(&mut trial);
                }
                let r_trial = residual(&trial[..]);
                evaluations += 1;

                let trial_cost = if r_trial.len() == r.len() && r_trial.iter().all(|v| v.is_finite()) {
                    half_sum_sq(&r_trial)
                } else {
                    f64::INFINITY
                };

                if trial_cost < cost {
                    let step_norm = norm_diff(&trial, &p);
                    let reduction = cost - trial_cost;
                    let prev_cost = cost;

                    p = trial;
                    r = r_trial;
                    cost = trial_cost;
                    lambda = (lambda / 10.0).max(MIN_DAMPING);

                    let p_norm = p.iter().map(|v| v * v).sum::<f64>().sqrt();
                    if reduction <= opts.ftol * prev_cost || step_norm <= opts.xtol * (opts.xtol + p_norm) {
                        return Ok(report(p, cost, iterations, evaluations));
                    }
                    break;
                }

                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    // No damped step lowers the cost: we are at a (local) minimum.
                    return Ok(report(p, cost, iterations, evaluations));
                }
            }
        }
    }
}

fn half_sum_sq(r: &[f64]) -> f64 {
    0.5 * r.iter().map(|v| v * v).sum::<f64>()
}

fn norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Forward-difference Jacobian `∂r_i/∂p_j`.
///
/// On failure returns the offending parameter index and a reason.
fn jacobian(
    residual: &ResidualFn<'_>,
    p: &[f64],
    r: &[f64],
    bounds: Option<&Bounds>,
    evaluations: &mut usize,
) -> Result<DMatrix<f64>, (usize, String)> {
    let m = r.len();
    let n = p.len();
    let eps = f64::EPSILON.sqrt();
    let mut jac = DMatrix::<f64>::zeros(m, n);

    for j in 0..n {
        let mut h = eps * p[j].abs().max(1.0);
        // Keep the probe inside the box: flip inward, or shrink to the wider side
        // when the box is narrower than the step.
        if let Some(b) = bounds {
            if p[j] + h > b.upper[j] {
                let up = b.upper[j] - p[j];
                let down = p[j] - b.lower[j];
                h = if down >= h {
                    -h
                } else if up >= down {
                    up
                } else {
                    -down
                };
            }
        }
        if h == 0.0 {
            // Pinned parameter (lower == upper): no room to probe, column stays zero.
            continue;
        }

        let mut probe = p.to_vec();
        probe[j] += h;
        let r_probe = residual(&probe[..]);
        *evaluations += 1;

        if r_probe.len() != m {
            return Err((j, format!("residual length changed from {m} to {}", r_probe.len())));
        }
        for i in 0..m {
            let d = (r_probe[i] - r[i]) / h;
            if !d.is_finite() {
                return Err((j, "non-finite Jacobian entry".to_string()));
            }
            jac[(i, j)] = d;
        }
    }
    Ok(jac)
}

fn damped_step(jac: &DMatrix<f64>, r: &DVector<f64>, scale: &[f64], lambda: f64) -> Option<DVector<f64>> {
    let (m, n) = jac.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(jac);
    let sl = lambda.sqrt();
    for j in 0..n {
        a[(m + j, j)] = sl * scale[j];
    }

    let mut b = DVector::<f64>::zeros(m + n);
    for i in 0..m {
        b[i] = -r[i];
    }
    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp_residual(x: &[f64], y: &[f64]) -> impl Fn(&[f64]) -> Vec<f64> + Sync {
        let x = x.to_vec();
        let y = y.to_vec();
        move |p: &[f64]| {
            x.iter()
                .zip(&y)
                .map(|(xi, yi)| p[0] * (xi / p[1]).exp() + p[2] - yi)
                .collect()
        }
    }

    #[test]
    fn recovers_linear_parameters() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 - 2.0 * v).collect();
        let res = move |p: &[f64]| -> Vec<f64> { x.iter().zip(&y).map(|(xi, yi)| p[0] + p[1] * xi - yi).collect() };

        let report = LevenbergMarquardt::default().minimize(&res, &[0.0, 0.0], None).unwrap();
        assert!((report.params[0] - 3.0).abs() < 1e-6, "{:?}", report.params);
        assert!((report.params[1] + 2.0).abs() < 1e-6, "{:?}", report.params);
        assert!(report.cost < 1e-10);
    }

    #[test]
    fn recovers_exponential_parameters() {
        let x: Vec<f64> = (0..50).map(|i| -1.0 + i as f64 * 0.04).collect();
        let truth = [std::f64::consts::PI, std::f64::consts::SQRT_2, 1.0];
        let y: Vec<f64> = x.iter().map(|v| truth[0] * (v / truth[1]).exp() + truth[2]).collect();
        let res = exp_residual(&x, &y);

        let report = LevenbergMarquardt::default().minimize(&res, &[1.0, 1.0, 1.0], None).unwrap();
        for (a, b) in report.params.iter().zip(truth) {
            assert!((a - b).abs() < 1e-4, "{:?}", report.params);
        }
    }

    #[test]
    fn non_finite_start_is_a_convergence_error() {
        let res = |p: &[f64]| -> Vec<f64> { vec![(p[0]).ln(), 1.0] };
        let err = LevenbergMarquardt::default().minimize(&res, &[-1.0], None).unwrap_err();
        match err {
            ProcessError::Convergence { guess, parameter, .. } => {
                assert_eq!(guess, vec![-1.0]);
                assert_eq!(parameter, None);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_finite_jacobian_names_the_parameter() {
        // Finite at the guess, but the forward probe of p[1] crosses ln's domain.
        let res = |p: &[f64]| -> Vec<f64> { vec![p[0] - 2.0, (1.0 - p[1]).ln()] };
        let guess = [0.5, 1.0 - 1e-9];
        let err = LevenbergMarquardt::default().minimize(&res, &guess, None).unwrap_err();
        match err {
            ProcessError::Convergence { guess: g, parameter, .. } => {
                assert_eq!(parameter, Some(1));
                assert_eq!(g, guess.to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn jacobian_probe_stays_inside_narrow_box() {
        // The box is far narrower than the difference step; any probe outside it is NaN.
        let res = |p: &[f64]| -> Vec<f64> {
            if (0.0..=1e-10).contains(&p[0]) {
                vec![p[0] - 1.0, p[1] - 3.0]
            } else {
                vec![f64::NAN, f64::NAN]
            }
        };
        let bounds = Bounds::new(vec![0.0, -10.0], vec![1e-10, 10.0]);
        let report = LevenbergMarquardt::default()
            .minimize(&res, &[5e-11, 0.0], Some(&bounds))
            .unwrap();
        assert!((0.0..=1e-10).contains(&report.params[0]), "{:?}", report.params);
    }

    #[test]
    fn pinned_parameter_is_left_alone() {
        let res = |p: &[f64]| -> Vec<f64> { vec![p[0] - 1.0, p[1] - 3.0] };
        let bounds = Bounds::new(vec![2.0, -10.0], vec![2.0, 10.0]);
        let report = LevenbergMarquardt::default()
            .minimize(&res, &[2.0, 0.0], Some(&bounds))
            .unwrap();
        assert_eq!(report.params[0], 2.0);
        assert!((report.params[1] - 3.0).abs() < 1e-6, "{:?}", report.params);
    }

    #[test]
    fn iteration_cap_is_enforced() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 5.0 * (v / 0.7).exp() - 2.0).collect();
        let res = exp_residual(&x, &y);
        let solver = LevenbergMarquardt::new(SolverOptions {
            max_iterations: 1,
            ..SolverOptions::default()
        });
        let err = solver.minimize(&res, &[1.0, 3.0, 0.0], None).unwrap_err();
        assert!(matches!(err, ProcessError::Convergence { .. }), "{err:?}");
    }

    #[test]
    fn bounds_are_respected() {
        // Unconstrained optimum is p = 5; the box caps it at 2.
        let res = |p: &[f64]| -> Vec<f64> { vec![p[0] - 5.0, 0.5 * (p[0] - 5.0)] };
        let bounds = Bounds::new(vec![0.0], vec![2.0]);
        let report = LevenbergMarquardt::default()
            .minimize(&res, &[1.0], Some(&bounds))
            .unwrap();
        assert!((report.params[0] - 2.0).abs() < 1e-9, "{:?}", report.params);
    }

    #[test]
    fn infeasible_guess_is_rejected() {
        let res = |p: &[f64]| -> Vec<f64> { vec![p[0]] };
        let bounds = Bounds::new(vec![0.0], vec![1.0]);
        let err = LevenbergMarquardt::default()
            .minimize(&res, &[3.0], Some(&bounds))
            .unwrap_err();
        assert!(matches!(err, ProcessError::InvalidArgument(_)));
    }
}
