//! Ambulance-side session: position samples in, tracking records out.

use std::io::BufRead;

use chrono::Utc;
use chrono_tz::Tz;

use crate::facility::{FacilityResolver, ResolveError};
use crate::geo::GeoPoint;
use crate::routing::RouteProvider;

use super::record::TrackingRecord;
use super::store::{StoreError, TrackingStore};

/// Position source failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    /// Location permission refused. Ends the session.
    #[error("Location permission denied")]
    Denied,
    /// A single sample could not be read. The session keeps going.
    #[error("Position unavailable: {0}")]
    Unavailable(String),
}

/// A stream of position fixes. `None` means the stream has ended.
pub trait PositionSource {
    fn next_sample(&mut self) -> Option<Result<GeoPoint, PositionError>>;
}

/// Reads `lat,lng` (or `lat lng`) fixes, one per line. A line reading
/// `denied` stands for a permission refusal; blank lines and `#` comments
/// are skipped.
pub struct LinePositionSource<R> {
    reader: R,
    line_no: usize,
}

impl<R: BufRead> LinePositionSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line_no: 0 }
    }
}

impl<R: BufRead> PositionSource for LinePositionSource<R> {
    fn next_sample(&mut self) -> Option<Result<GeoPoint, PositionError>> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(PositionError::Unavailable(e.to_string()))),
            }
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("denied") {
                return Some(Err(PositionError::Denied));
            }
            return Some(
                parse_sample(trimmed)
                    .map_err(|e| PositionError::Unavailable(format!("line {}: {}", self.line_no, e))),
            );
        }
    }
}

fn parse_sample(line: &str) -> Result<GeoPoint, String> {
    let parts: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 2 {
        return Err(format!("expected 'lat,lng', got '{}'", line));
    }
    let lat: f64 = parts[0].parse().map_err(|_| format!("bad latitude '{}'", parts[0]))?;
    let lng: f64 = parts[1].parse().map_err(|_| format!("bad longitude '{}'", parts[1]))?;
    GeoPoint::new(lat, lng).map_err(|e| e.to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One ambulance publishing its position to the shared slot.
pub struct AmbulanceSession<'a> {
    id: String,
    resolver: &'a FacilityResolver,
    store: &'a mut TrackingStore,
    tz: Tz,
    route_provider: Option<&'a dyn RouteProvider>,
}

impl<'a> AmbulanceSession<'a> {
    pub fn new(id: impl Into<String>, resolver: &'a FacilityResolver, store: &'a mut TrackingStore, tz: Tz) -> Self {
        Self {
            id: id.into(),
            resolver,
            store,
            tz,
            route_provider: None,
        }
    }

    /// Pre-fetch a driving route with every sample and ship it in the record.
    pub fn with_route_provider(mut self, provider: &'a dyn RouteProvider) -> Self {
        self.route_provider = Some(provider);
        self
    }

    /// Resolve one fix and publish it.
    pub fn publish_sample(&mut self, position: GeoPoint) -> Result<TrackingRecord, SessionError> {
        let result = self.resolver.resolve(position)?;
        let mut record = TrackingRecord::from_resolution(&self.id, position, &result, Utc::now(), self.tz);

        if let Some(provider) = self.route_provider {
            // A failed fetch publishes without a route rather than a partial one.
            match provider.route(position, result.facility.location) {
                Ok(route) => record = record.with_route(route.to_pairs()),
                Err(e) => tracing::warn!(id = %self.id, error = %e, "route prefetch failed"),
            }
        }

        let stored = self.store.publish(record)?;
        tracing::info!(
            id = %stored.id,
            seq = stored.seq,
            hospital = %stored.hospital.name,
            distance_km = %stored.distance,
            eta_min = %stored.eta,
            "published position"
        );
        Ok(stored)
    }

    /// Drain `source`, publishing every good fix. Returns how many were published.
    ///
    /// A permission denial ends the session with an error; unreadable
    /// samples are logged and skipped.
    pub fn run(&mut self, source: &mut dyn PositionSource) -> Result<usize, SessionError> {
        let mut published = 0;
        while let Some(sample) = source.next_sample() {
            match sample {
                Ok(position) => {
                    self.publish_sample(position)?;
                    published += 1;
                }
                Err(PositionError::Denied) => {
                    tracing::error!(id = %self.id, "location permission denied, stopping session");
                    return Err(PositionError::Denied.into());
                }
                Err(PositionError::Unavailable(msg)) => {
                    tracing::warn!(id = %self.id, "skipping sample: {}", msg);
                }
            }
        }
        Ok(published)
    }
}
