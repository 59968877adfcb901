//! JSON exports.
//!
//! - fit JSON: the fitted parameters plus run metadata, for downstream scripts
//! - display JSON: a list of `DisplayRequest`s, so figures can be re-rendered
//!   later (`dp plot`, `dp view`) without refitting

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DisplayRequest, FitResult, SolverReport};
use crate::error::AppError;

/// Schema of a fit JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitExport {
    pub tool: String,
    /// Serialized as RFC 3339.
    pub generated: DateTime<Utc>,
    pub model: String,
    pub result: FitResult,
    /// Solver iterations; absent for linear (polynomial) fits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl FitExport {
    pub fn new(model: impl Into<String>, result: FitResult, report: Option<&SolverReport>) -> Self {
        Self {
            tool: "dp".to_string(),
            generated: Utc::now(),
            model: model.into(),
            result,
            iterations: report.map(|r| r.iterations),
            cost: report.map(|r| r.cost),
        }
    }
}

pub fn write_fit_json(path: &Path, export: &FitExport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, export)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))
}

pub fn read_fit_json(path: &Path) -> Result<FitExport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))
}

pub fn write_display_json(path: &Path, requests: &[DisplayRequest]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create display JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, requests)
        .map_err(|e| AppError::new(2, format!("Failed to write display JSON: {e}")))
}

pub fn read_display_json(path: &Path) -> Result<Vec<DisplayRequest>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open display JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid display JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Series;

    fn tmp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dp_{name}_{}.json", std::process::id()))
    }

    #[test]
    fn fit_json_has_rfc3339_timestamp() {
        let result = FitResult {
            params: vec![1.0, 2.0],
            fitted: vec![0.5],
            r_squared: 0.9,
        };
        let report = SolverReport {
            params: vec![1.0, 2.0],
            cost: 0.25,
            iterations: 7,
            evaluations: 30,
        };
        let export = FitExport::new("exponential", result, Some(&report));
        let path = tmp("fit");
        write_fit_json(&path, &export).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let stamp = raw["generated"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok(), "{stamp}");
        assert_eq!(raw["tool"], "dp");
        assert_eq!(raw["iterations"], 7);

        assert_eq!(read_fit_json(&path).unwrap(), export);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn display_json_round_trip() {
        let mut req = DisplayRequest::new("R² = 1.00000", "x", "y");
        req.push(Series::line("fit", vec![0.0, 1.0], vec![2.0, 3.0]));
        let path = tmp("display");
        write_display_json(&path, std::slice::from_ref(&req)).unwrap();
        assert_eq!(read_display_json(&path).unwrap(), vec![req]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_argument_error() {
        let err = read_display_json(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
