//! Raw cells -> normalized series.
//!
//! - timestamp parsing onto one epoch-millisecond scale (`timestamp`)
//! - time/temperature column inference for uploads (`columns`)
//! - consecutive integration intervals (`intervals`)
//! - sampling-quality summary used by the scorer (`sampling`)

pub mod columns;
pub mod intervals;
pub mod sampling;
pub mod timestamp;

pub use columns::*;
pub use intervals::*;
pub use sampling::*;
pub use timestamp::*;
