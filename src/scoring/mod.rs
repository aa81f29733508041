//! Model reliability scoring and ranking.
//!
//! Both stages are deterministic rule sets over the analysis outputs. They are
//! kept as small pure functions returning `(score, reasons)` records so a rule
//! set can be swapped without touching downstream consumers.

pub mod confidence;
pub mod ranking;

pub use confidence::*;
pub use ranking::*;
