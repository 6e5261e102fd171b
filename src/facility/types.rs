//! Core types for the facility subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geo::GeoPoint;

/// A named destination (hospital) at fixed coordinates.
///
/// Serialized flat as `{ "name", "lat", "lng" }`, the shape dispatch
/// front ends read from the tracking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub name: String,
    #[serde(flatten)]
    pub location: GeoPoint,
}

impl Facility {
    pub fn new(name: impl Into<String>, location: GeoPoint) -> Self {
        Self { name: name.into(), location }
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}

/// Output of one resolve cycle. Derived per sample, never stored as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub facility: Facility,
    pub distance_km: f64,
    /// Straight-line estimate at the assumed average speed.
    pub eta_minutes: f64,
    /// Travel time reported by the routing service, when one was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_eta_minutes: Option<f64>,
}

/// Resolver errors. Both cases are caller mistakes and are never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
