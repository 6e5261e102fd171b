//! The shared tracking record.
//!
//! Field names and string formatting match what browser dispatch views read:
//! distance with 2 decimals, ETA with 1 decimal, wall-clock time.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::facility::{Facility, ResolutionResult, ResolveError};
use crate::geo::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub hospital: Facility,
    pub distance: String,
    pub eta: String,
    pub time: String,
    /// Pre-fetched route as `[lat, lng]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<[f64; 2]>>,
    /// Slot version, bumped by the store on every publish. Writers that
    /// predate versioning leave it at 0.
    #[serde(default)]
    pub seq: u64,
}

impl TrackingRecord {
    pub fn from_resolution(
        id: &str,
        position: GeoPoint,
        result: &ResolutionResult,
        at: DateTime<Utc>,
        tz: Tz,
    ) -> Self {
        Self {
            id: id.to_string(),
            lat: position.latitude,
            lng: position.longitude,
            hospital: result.facility.clone(),
            distance: format!("{:.2}", result.distance_km),
            eta: format!("{:.1}", result.eta_minutes),
            time: at.with_timezone(&tz).format("%H:%M:%S").to_string(),
            route: None,
            seq: 0,
        }
    }

    pub fn with_route(mut self, route: Vec<[f64; 2]>) -> Self {
        self.route = Some(route);
        self
    }

    /// Ambulance position, range-checked since the slot may hold foreign data.
    pub fn position(&self) -> Result<GeoPoint, ResolveError> {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Destination coordinates, range-checked the same way.
    pub fn hospital_location(&self) -> Result<GeoPoint, ResolveError> {
        let loc = self.hospital.location;
        GeoPoint::new(loc.latitude, loc.longitude)
    }

    /// Pre-fetched route as points; `None` when absent, empty, or out of range.
    pub fn route_points(&self) -> Option<Vec<GeoPoint>> {
        let pairs = self.route.as_ref().filter(|r| !r.is_empty())?;
        pairs
            .iter()
            .map(|&[lat, lng]| GeoPoint::new(lat, lng).ok())
            .collect()
    }

    /// Operator-side status text.
    pub fn status_text(&self) -> String {
        format!(
            "Status: Emergency Active\nHospital: {}\nDistance: {} km\nETA: {} min",
            self.hospital.name, self.distance, self.eta
        )
    }

    /// Dispatcher-side info panel text.
    pub fn info_panel(&self) -> String {
        format!(
            "Ambulance: {}\nHospital: {}\nDistance: {} km\nETA: {} min\nUpdated: {}",
            self.id, self.hospital.name, self.distance, self.eta, self.time
        )
    }
}
