//! Facility sets: the built-in hospital list and JSON facility files.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::geo::GeoPoint;

use super::types::{Facility, ResolveError};

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinHospital {
    name: &'static str,
    lat: f64,
    lng: f64,
}

/// Order matters: ties resolve to the earlier entry.
const BUILTIN_HOSPITALS: &[BuiltinHospital] = &[
    BuiltinHospital { name: "Apollo Hospital", lat: 17.4108, lng: 78.3983 },
    BuiltinHospital { name: "Care Hospital", lat: 17.3920, lng: 78.4483 },
    BuiltinHospital { name: "City Hospital", lat: 17.3850, lng: 78.4867 },
];

/// The built-in hospital set.
pub fn builtin_facilities() -> Vec<Facility> {
    BUILTIN_HOSPITALS
        .iter()
        .map(|h| Facility {
            name: h.name.to_string(),
            location: GeoPoint { latitude: h.lat, longitude: h.lng },
        })
        .collect()
}

// ─── Facility files ─────────────────────────────────────────────

#[derive(Deserialize)]
struct FacilityEntry {
    name: String,
    lat: f64,
    lng: f64,
}

/// Errors loading a facility file.
#[derive(Debug, thiserror::Error)]
pub enum FacilityFileError {
    #[error("Cannot read facility file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed facility file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] ResolveError),
}

/// Load a facility set from a JSON array of `{ "name", "lat", "lng" }`.
///
/// Every coordinate is range-checked and the list must be non-empty.
pub fn load_facilities_from(path: &Path) -> Result<Vec<Facility>, FacilityFileError> {
    let label = path.display().to_string();
    let data = fs::read_to_string(path).map_err(|source| FacilityFileError::Io {
        path: label.clone(),
        source,
    })?;
    parse_facilities(&data, &label)
}

fn parse_facilities(data: &str, label: &str) -> Result<Vec<Facility>, FacilityFileError> {
    let entries: Vec<FacilityEntry> = serde_json::from_str(data).map_err(|source| FacilityFileError::Parse {
        path: label.to_string(),
        source,
    })?;

    if entries.is_empty() {
        return Err(ResolveError::InvalidArgument("facility file lists no facilities".into()).into());
    }

    entries
        .into_iter()
        .map(|e| -> Result<Facility, FacilityFileError> {
            Ok(Facility::new(e.name, GeoPoint::new(e.lat, e.lng)?))
        })
        .collect()
}
