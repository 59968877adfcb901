//! `dataproc` library crate.
//!
//! The binary (`dp`) is a thin wrapper around this library so that:
//!
//! - the numeric helpers (smoothing, phase, resampling, fits) are testable
//!   without spawning processes
//! - other tools can call them directly on slices
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod arrays;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod signal;
pub mod tui;
