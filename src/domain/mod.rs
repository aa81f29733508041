//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw tabular input (`RawValue`, `RawTable`)
//! - normalized series points and integration intervals
//! - analysis outputs (`ExposureReport`, `KineticModelResult`, `ConfidenceScore`, `ComparisonRow`)
//! - run configuration (`AnalysisConfig`, `KineticsConfig`)

pub mod types;

pub use types::*;
