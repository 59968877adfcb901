//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (snapshot tests below)

use crate::domain::{FitResult, SolverReport};
use crate::fit::PolyFit;
use crate::io::ColumnTable;
use crate::math::rms;
use crate::signal::count_nan;

/// Summary of a nonlinear fit.
pub fn format_fit_summary(
    model: &str,
    result: &FitResult,
    report: Option<&SolverReport>,
    starts: usize,
    failed_starts: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== dp - curve fit ===\n");
    out.push_str(&format!("Model: {model}\n"));
    out.push_str(&format!("Points: n={}\n", result.fitted.len()));
    if starts > 1 {
        out.push_str(&format!("Starts: {starts} ({failed_starts} failed)\n"));
    }
    if let Some(r) = report {
        out.push_str(&format!(
            "Solver: iterations={} evaluations={} cost={:.6e}\n",
            r.iterations, r.evaluations, r.cost
        ));
    }
    out.push_str(&format!("R² = {:.5}\n", result.r_squared));
    out.push_str(&format!("Parameters: {}\n", fmt_vec(&result.params)));
    for (i, p) in result.params.iter().enumerate() {
        out.push_str(&format!("  {i}: {p}\n"));
    }

    out
}

/// Summary of a polynomial fit.
pub fn format_poly_summary(fit: &PolyFit) -> String {
    let mut out = String::new();
    out.push_str("=== dp - polynomial fit ===\n");
    out.push_str(&format!("Order: {}\n", fit.order));
    out.push_str(&format!("Points: n={}\n", fit.fitted.len()));
    out.push_str(&format!("R² = {:.5}\n", fit.r_squared));
    out.push_str(&format!("Coefficients (highest power first): {}\n", fmt_vec(&fit.coefs)));
    out
}

/// Per-column row count, NaN count and RMS of the finite values.
pub fn format_column_summary(table: &ColumnTable) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:<20} {:>8} {:>8} {:>14}\n", "column", "rows", "nan", "rms").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<8} {:-<8} {:-<14}\n", "", "", "", "").trim_end());
    out.push('\n');

    for (name, col) in table.headers().iter().zip(table.columns()) {
        let finite: Vec<f64> = col.iter().copied().filter(|v| v.is_finite()).collect();
        let rms = rms(&finite).map(|v| format!("{v:.6}")).unwrap_or_else(|_| "-".to_string());
        out.push_str(&format!(
            "{:<20} {:>8} {:>8} {:>14}\n",
            truncate(name, 20),
            col.len(),
            count_nan(col),
            rms
        ));
    }

    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_summary_lists_parameters() {
        let result = FitResult {
            params: vec![3.0, -0.5],
            fitted: vec![1.0, 2.0, 3.0],
            r_squared: 0.123456,
        };
        let report = SolverReport {
            params: vec![3.0, -0.5],
            cost: 0.5,
            iterations: 4,
            evaluations: 13,
        };
        let txt = format_fit_summary("line", &result, Some(&report), 1, 0);
        let expected = concat!(
            "=== dp - curve fit ===\n",
            "Model: line\n",
            "Points: n=3\n",
            "Solver: iterations=4 evaluations=13 cost=5.000000e-1\n",
            "R² = 0.12346\n",
            "Parameters: [3.000000, -0.500000]\n",
            "  0: 3\n",
            "  1: -0.5\n",
        );
        assert_eq!(txt, expected);

        let multi = format_fit_summary("line", &result, None, 8, 2);
        assert!(multi.contains("Starts: 8 (2 failed)"));
        assert!(!multi.contains("Solver:"));
    }

    #[test]
    fn column_summary_counts_nan() {
        let table = ColumnTable::new(
            vec!["a".into(), "a_very_long_column_name_here".into()],
            vec![vec![3.0, f64::NAN, -3.0], vec![f64::NAN]],
        )
        .unwrap();
        let txt = format_column_summary(&table);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("a "));
        assert!(lines[2].contains("3.000000"));
        assert!(lines[3].starts_with("a_very_long_column_."));
        assert!(lines[3].trim_end().ends_with('-'));
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
