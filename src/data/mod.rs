//! Data acquisition.
//!
//! - device-feed REST client (`device_feed_client`)
//! - seeded synthetic logger traces (`synthetic`)

pub mod device_feed_client;
pub mod synthetic;

pub use device_feed_client::*;
pub use synthetic::*;
