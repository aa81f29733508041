//! `shelf-life` library crate.
//!
//! The binary (`shelf`) is a thin wrapper around this library so that:
//!
//! - the analysis pipeline is testable without spawning processes
//! - every stage is a pure function that can be reused on its own
//!   (e.g. a web endpoint or a batch job)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod exposure;
pub mod io;
pub mod math;
pub mod models;
pub mod normalize;
pub mod report;
pub mod scoring;
