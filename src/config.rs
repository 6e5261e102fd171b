//! Runtime settings: built-in defaults, overridable from `AMBUTRACK_*`
//! environment variables and then from command-line flags.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::facility::{builtin_facilities, load_facilities_from, FacilityFileError, FacilityResolver, DEFAULT_SPEED_KMH};
use crate::routing::DEFAULT_OSRM_URL;
use crate::tracking::TrackingStore;

/// Default dispatch poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error(transparent)]
    Facilities(#[from] FacilityFileError),
    #[error("Invalid resolver settings: {0}")]
    Resolver(#[from] crate::facility::ResolveError),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_path: PathBuf,
    /// JSON facility file; the built-in hospital set when `None`.
    pub facilities_path: Option<PathBuf>,
    pub speed_kmh: f64,
    /// Zone for the wall-clock time written into tracking records.
    pub tz: Tz,
    pub poll_interval: Duration,
    pub osrm_url: String,
    /// Smooth-move frames per marker update; 0 jumps straight to the fix.
    pub smooth_steps: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: TrackingStore::default_path(),
            facilities_path: None,
            speed_kmh: DEFAULT_SPEED_KMH,
            tz: chrono_tz::Asia::Kolkata,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            osrm_url: DEFAULT_OSRM_URL.to_string(),
            smooth_steps: 0,
        }
    }
}

impl Settings {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `AMBUTRACK_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut s = Self::default();

        if let Some(v) = lookup("AMBUTRACK_STORE") {
            s.store_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("AMBUTRACK_FACILITIES") {
            s.facilities_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("AMBUTRACK_SPEED_KMH") {
            s.speed_kmh = parse_speed(&v)?;
        }
        if let Some(v) = lookup("AMBUTRACK_TZ") {
            s.tz = parse_tz(&v)?;
        }
        if let Some(v) = lookup("AMBUTRACK_POLL_MS") {
            s.poll_interval = parse_interval_ms(&v)?;
        }
        if let Some(v) = lookup("AMBUTRACK_OSRM_URL") {
            s.osrm_url = v;
        }
        if let Some(v) = lookup("AMBUTRACK_SMOOTH_STEPS") {
            s.smooth_steps = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AMBUTRACK_SMOOTH_STEPS",
                value: v.clone(),
            })?;
        }

        Ok(s)
    }

    /// Load the facility set and bind it to the configured speed.
    pub fn build_resolver(&self) -> Result<FacilityResolver, ConfigError> {
        let facilities = match &self.facilities_path {
            Some(path) => load_facilities_from(path)?,
            None => builtin_facilities(),
        };
        Ok(FacilityResolver::with_speed(facilities, self.speed_kmh)?)
    }

    pub fn open_store(&self) -> TrackingStore {
        TrackingStore::load_from(self.store_path.clone())
    }
}

pub fn parse_speed(s: &str) -> Result<f64, ConfigError> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::InvalidValue { key: "speed", value: s.to_string() }),
    }
}

pub fn parse_tz(s: &str) -> Result<Tz, ConfigError> {
    s.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key: "tz", value: s.to_string() })
}

pub fn parse_interval_ms(s: &str) -> Result<Duration, ConfigError> {
    match s.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidValue { key: "poll interval", value: s.to_string() }),
    }
}
