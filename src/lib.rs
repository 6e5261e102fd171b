//! ambutrack: ambulance-to-hospital tracking.
//!
//! Each position fix is resolved to the nearest hospital by great-circle
//! distance, given a straight-line ETA, and published to a single shared
//! slot that a dispatch view polls.

pub mod config;
pub mod facility;
pub mod geo;
pub mod routing;
pub mod server;
pub mod tracking;
