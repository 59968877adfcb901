//! Error types.
//!
//! - `ProcessError` is returned by the numeric core (arrays, signal, fit).
//! - `AppError` is the binary-facing error: a message plus a process exit code.
//!
//! Exit codes used by `dp`:
//! - `2`: bad arguments, unreadable/unwritable files
//! - `3`: input data unusable (empty, mismatched, non-monotonic, degenerate)
//! - `4`: fit or rendering failure

use thiserror::Error;

/// Failure of a numeric operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProcessError {
    #[error("input sequence is empty")]
    EmptyInput,

    #[error("length mismatch: expected {expected} values, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("degenerate fit: observed data has zero variance")]
    DegenerateFit,

    #[error("{}", format_convergence(.reason, .guess, .parameter))]
    Convergence {
        reason: String,
        guess: Vec<f64>,
        parameter: Option<usize>,
    },

    #[error("source domain is not non-decreasing at index {index}")]
    NonMonotonicDomain { index: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ProcessError {
    pub(crate) fn convergence(reason: impl Into<String>, guess: &[f64], parameter: Option<usize>) -> Self {
        ProcessError::Convergence {
            reason: reason.into(),
            guess: guess.to_vec(),
            parameter,
        }
    }

    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProcessError::InvalidArgument(_) => 2,
            ProcessError::EmptyInput
            | ProcessError::LengthMismatch { .. }
            | ProcessError::DegenerateFit
            | ProcessError::NonMonotonicDomain { .. } => 3,
            ProcessError::Convergence { .. } => 4,
        }
    }
}

fn format_convergence(reason: &str, guess: &[f64], parameter: &Option<usize>) -> String {
    let guess = guess
        .iter()
        .map(|v| format!("{v}"))
        .collect::<Vec<_>>()
        .join(", ");
    match parameter {
        Some(idx) => format!("fit did not converge: {reason} (parameter {idx}, initial guess [{guess}])"),
        None => format!("fit did not converge: {reason} (initial guess [{guess}])"),
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ProcessError> for AppError {
    fn from(err: ProcessError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convergence_message_names_parameter_and_guess() {
        let err = ProcessError::convergence("non-finite Jacobian column", &[1.0, 2.5], Some(1));
        let msg = err.to_string();
        assert!(msg.contains("parameter 1"), "{msg}");
        assert!(msg.contains("[1, 2.5]"), "{msg}");
    }

    #[test]
    fn process_errors_map_to_exit_codes() {
        let app: AppError = ProcessError::DegenerateFit.into();
        assert_eq!(app.exit_code(), 3);
        let app: AppError = ProcessError::convergence("x", &[], None).into();
        assert_eq!(app.exit_code(), 4);
        let app: AppError = ProcessError::InvalidArgument("bad".into()).into();
        assert_eq!(app.exit_code(), 2);
    }
}
