//! Small numeric helpers shared by the scorer and the kinetics models.

pub mod stats;

pub use stats::*;
