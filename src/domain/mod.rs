//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - fit outputs (`FitResult`, `SolverReport`, `FitState`)
//! - parameter constraints (`Bounds`)
//! - the renderer-agnostic display description (`DisplayRequest`, `Series`, ...)
//! - run configuration assembled from CLI flags (`FitConfig`)

pub mod types;

pub use types::*;
