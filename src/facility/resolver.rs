//! Nearest-facility resolver.
//!
//! Flow per sample:  query point → nearest facility (strict `<` scan) → distance → ETA

use crate::geo::{great_circle_distance_km, GeoPoint};

use super::types::{Facility, ResolutionResult, ResolveError};

/// Assumed average ambulance speed for straight-line ETAs.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Return the facility closest to `query`.
///
/// Ties keep the earliest facility in `facilities`.
pub fn find_nearest<'a>(query: GeoPoint, facilities: &'a [Facility]) -> Result<&'a Facility, ResolveError> {
    let (first, rest) = facilities
        .split_first()
        .ok_or_else(|| ResolveError::InvalidArgument("facility set is empty".into()))?;

    let mut nearest = first;
    let mut min_dist = great_circle_distance_km(query, first.location);

    for facility in rest {
        let d = great_circle_distance_km(query, facility.location);
        if d < min_dist {
            min_dist = d;
            nearest = facility;
        }
    }

    Ok(nearest)
}

/// Minutes to cover `distance_km` at `assumed_speed_kmh`.
pub fn estimate_eta(distance_km: f64, assumed_speed_kmh: f64) -> Result<f64, ResolveError> {
    if !assumed_speed_kmh.is_finite() || assumed_speed_kmh <= 0.0 {
        return Err(ResolveError::InvalidArgument(format!(
            "assumed speed must be positive, got {} km/h",
            assumed_speed_kmh
        )));
    }
    Ok(distance_km / assumed_speed_kmh * 60.0)
}

/// Nearest facility plus distance and ETA at [`DEFAULT_SPEED_KMH`].
pub fn resolve(query: GeoPoint, facilities: &[Facility]) -> Result<ResolutionResult, ResolveError> {
    resolve_at_speed(query, facilities, DEFAULT_SPEED_KMH)
}

fn resolve_at_speed(
    query: GeoPoint,
    facilities: &[Facility],
    speed_kmh: f64,
) -> Result<ResolutionResult, ResolveError> {
    let facility = find_nearest(query, facilities)?;
    let distance_km = great_circle_distance_km(query, facility.location);
    let eta_minutes = estimate_eta(distance_km, speed_kmh)?;

    Ok(ResolutionResult {
        facility: facility.clone(),
        distance_km,
        eta_minutes,
        route_eta_minutes: None,
    })
}

/// A resolver bound to a fixed, non-empty facility set and an assumed speed.
///
/// Immutable once built; share it by reference.
#[derive(Debug, Clone)]
pub struct FacilityResolver {
    facilities: Vec<Facility>,
    speed_kmh: f64,
}

impl FacilityResolver {
    pub fn new(facilities: Vec<Facility>) -> Result<Self, ResolveError> {
        Self::with_speed(facilities, DEFAULT_SPEED_KMH)
    }

    pub fn with_speed(facilities: Vec<Facility>, speed_kmh: f64) -> Result<Self, ResolveError> {
        if facilities.is_empty() {
            return Err(ResolveError::InvalidArgument("facility set is empty".into()));
        }
        // Validates the speed the same way every later call would.
        estimate_eta(0.0, speed_kmh)?;
        Ok(Self { facilities, speed_kmh })
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn resolve(&self, query: GeoPoint) -> Result<ResolutionResult, ResolveError> {
        resolve_at_speed(query, &self.facilities, self.speed_kmh)
    }
}
