//! Multi-start fitting.
//!
//! Nonlinear fits often need a guess "close enough" to converge. Instead of
//! hand-tuning, run the same model from several starting points in parallel
//! and keep the lowest-cost result.
//!
//! Selection is deterministic: minimum solver cost, ties broken by the lowest
//! start index. Each start is an independent `solve_fit` call, so results do not
//! depend on thread scheduling.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{Bounds, FitResult, SolverReport};
use crate::error::ProcessError;
use crate::fit::curve::solve_fit;
use crate::fit::solver::LeastSquaresSolver;
use crate::models::Model;

/// Best fit across a set of starting points.
#[derive(Debug, Clone)]
pub struct MultiStartFit {
    /// Index (into the guess list) of the winning start.
    pub best_index: usize,
    pub result: FitResult,
    pub report: SolverReport,
    /// Starts that failed, with their errors.
    pub failures: Vec<(usize, ProcessError)>,
}

#[derive(Debug, Clone)]
struct Candidate {
    idx: usize,
    result: FitResult,
    report: SolverReport,
}

/// Fit `model` from every guess in `guesses` and keep the best.
///
/// Fails only if every start fails; the error of the lowest-index start is
/// returned in that case.
pub fn fit_multi_start<M, S>(
    model: &M,
    solver: &S,
    guesses: &[Vec<f64>],
    bounds: Option<&Bounds>,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<MultiStartFit, ProcessError>
where
    M: Model,
    S: LeastSquaresSolver,
{
    if guesses.is_empty() {
        return Err(ProcessError::InvalidArgument("no starting points given".to_string()));
    }

    let outcomes: Vec<(usize, Result<(FitResult, SolverReport), ProcessError>)> = guesses
        .par_iter()
        .enumerate()
        .map(|(idx, guess)| (idx, solve_fit(model, solver, guess, bounds, x, y)))
        .collect();

    let mut candidates = Vec::new();
    let mut failures = Vec::new();
    for (idx, outcome) in outcomes {
        match outcome {
            Ok((result, report)) => candidates.push(Candidate { idx, result, report }),
            Err(err) => {
                warn!(start = idx, error = %err, "start failed");
                failures.push((idx, err));
            }
        }
    }

    let Some(first) = candidates.first() else {
        // `failures` is in index order because `collect` preserves order.
        let (_, err) = failures.swap_remove(0);
        return Err(err);
    };

    let mut best = first;
    for c in &candidates[1..] {
        if c.report.cost < best.report.cost || (c.report.cost == best.report.cost && c.idx < best.idx) {
            best = c;
        }
    }
    debug!(best = best.idx, cost = best.report.cost, n_starts = guesses.len(), "multi-start done");

    Ok(MultiStartFit {
        best_index: best.idx,
        result: best.result.clone(),
        report: best.report.clone(),
        failures,
    })
}

/// `base` followed by `extra` jittered copies.
///
/// Each parameter is perturbed by `N(0, rel_sigma · max(|p|, 1))`, seeded so the
/// same inputs always produce the same starts. Jittered guesses are clamped
/// into `bounds` when given.
pub fn jitter_guesses(
    base: &[f64],
    extra: usize,
    rel_sigma: f64,
    seed: u64,
    bounds: Option<&Bounds>,
) -> Result<Vec<Vec<f64>>, ProcessError> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| ProcessError::InvalidArgument(format!("noise distribution error: {e}")))?;
    if !(rel_sigma.is_finite() && rel_sigma >= 0.0) {
        return Err(ProcessError::InvalidArgument(format!(
            "jitter scale must be finite and >= 0, got {rel_sigma}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(extra + 1);
    out.push(base.to_vec());
    for _ in 0..extra {
        let mut g: Vec<f64> = base
            .iter()
            .map(|&p| p + rel_sigma * p.abs().max(1.0) * normal.sample(&mut rng))
            .collect();
        if let Some(b) = bounds {
            if b.lower.len() == g.len() && b.upper.len() == g.len() {
                b.project(&mut g);
            }
        }
        out.push(g);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::solver::LevenbergMarquardt;
    use crate::models::ModelKind;

    #[test]
    fn picks_lowest_cost_start() {
        let x: Vec<f64> = (0..60).map(|i| i as f64 * 0.1).collect();
        let truth = [1.5, 0.3, 4.0, 0.5];
        let y: Vec<f64> = x.iter().map(|&v| ModelKind::Cosine.eval(v, &truth)).collect();

        // Start 0 has the wrong frequency, start 1 is close.
        let guesses = vec![vec![1.0, 0.0, 4.0, 1.7], vec![1.0, 0.0, 4.0, 0.48]];
        let solver = LevenbergMarquardt::default();
        let best = fit_multi_start(&ModelKind::Cosine, &solver, &guesses, None, &[x], &y).unwrap();

        assert_eq!(best.best_index, 1);
        assert!(best.result.r_squared > 0.9999, "{}", best.result.r_squared);
    }

    #[test]
    fn fails_only_when_every_start_fails() {
        let x = vec![vec![1.0, 2.0, 3.0]];
        let y = vec![1.0, 2.0, 4.0];
        let solver = LevenbergMarquardt::default();

        let guesses = vec![vec![1.0, 0.0, 0.0], vec![1.0, 1.0, 0.0]];
        let ok = fit_multi_start(&ModelKind::Exponential, &solver, &guesses, None, &x, &y).unwrap();
        assert_eq!(ok.best_index, 1);
        assert_eq!(ok.failures.len(), 1);
        assert_eq!(ok.failures[0].0, 0);

        let all_bad = vec![vec![1.0, 0.0, 0.0], vec![2.0, 0.0, 0.0]];
        let err = fit_multi_start(&ModelKind::Exponential, &solver, &all_bad, None, &x, &y).unwrap_err();
        match err {
            ProcessError::Convergence { guess, .. } => assert_eq!(guess, vec![1.0, 0.0, 0.0]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn wrong_length_guesses_fail_without_panicking() {
        let x = vec![vec![1.0, 2.0, 3.0]];
        let y = vec![1.0, 2.0, 4.0];
        let solver = LevenbergMarquardt::default();
        let guesses = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0, 1.0, 2.0]];
        let err = fit_multi_start(&ModelKind::Cosine, &solver, &guesses, None, &x, &y).unwrap_err();
        assert_eq!(err, ProcessError::LengthMismatch { expected: 4, found: 3 });
    }

    #[test]
    fn jitter_is_deterministic_and_keeps_base_first() {
        let a = jitter_guesses(&[1.0, -2.0], 3, 0.2, 7, None).unwrap();
        let b = jitter_guesses(&[1.0, -2.0], 3, 0.2, 7, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(a[0], vec![1.0, -2.0]);
        assert_ne!(a[1], a[0]);
    }

    #[test]
    fn jitter_respects_bounds() {
        let bounds = Bounds::new(vec![0.0], vec![1.0]);
        let g = jitter_guesses(&[0.5], 20, 5.0, 1, Some(&bounds)).unwrap();
        assert!(g.iter().all(|v| (0.0..=1.0).contains(&v[0])));
    }
}
