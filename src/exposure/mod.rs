//! Cutoff-relative exposure statistics and display buckets.

pub mod analyzer;
pub mod buckets;

pub use analyzer::*;
pub use buckets::*;
