//! Data sources.
//!
//! Real data comes in through `io::table`; this module generates synthetic
//! samples for demos and tests.

pub mod synth;

pub use synth::*;
