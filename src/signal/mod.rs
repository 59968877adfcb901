//! Signal utilities: box-car smoothing, phase wrapping/unwrapping, NaN scans.

pub mod nan;
pub mod phase;
pub mod smooth;

pub use nan::*;
pub use phase::*;
pub use smooth::*;
