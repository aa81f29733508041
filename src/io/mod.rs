//! Input/output helpers.
//!
//! - CSV / JSON upload ingest and series extraction (`ingest`)
//! - logger device-feed XML (`device_feed`)
//! - report exports (JSON/CSV) (`export`)

pub mod device_feed;
pub mod export;
pub mod ingest;

pub use device_feed::*;
pub use export::*;
pub use ingest::*;
