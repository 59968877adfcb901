//! Curve fitting.
//!
//! Responsibilities:
//!
//! - goodness of fit (`stats`)
//! - the least-squares solver seam and its Levenberg-Marquardt implementation (`solver`)
//! - the model + guess + data wrapper (`curve`)
//! - polynomial fits (`poly`)
//! - parallel multi-start fitting (`multistart`)

pub mod curve;
pub mod multistart;
pub mod poly;
pub mod solver;
pub mod stats;

pub use curve::*;
pub use multistart::*;
pub use poly::*;
pub use solver::*;
pub use stats::*;
