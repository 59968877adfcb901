//! Fit models.
//!
//! A model maps independent data plus a parameter vector to predicted values.
//! The built-in kinds are small, pure functions so fitting code can stay generic
//! over the [`Model`] trait.

pub mod model;

pub use model::*;
