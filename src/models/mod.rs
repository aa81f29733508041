//! Temperature-kinetics shelf-life models.
//!
//! Rate laws and the mean kinetic temperature (`kinetics`) are small pure
//! functions; the six remaining-life models (`model`) are built on them, and
//! the risk-of-loss jitter plus the legacy hours-above table live in `risk`.

pub mod kinetics;
pub mod model;
pub mod risk;

pub use kinetics::*;
pub use model::*;
pub use risk::*;
