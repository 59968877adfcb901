//! Input/output helpers.
//!
//! - CSV column tables (`table`)
//! - fit and display JSON exports (`export`)

pub mod export;
pub mod table;

pub use export::*;
pub use table::*;
