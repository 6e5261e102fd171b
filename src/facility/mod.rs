//! Nearest-facility subsystem.
//!
//! Great-circle nearest-hospital selection, straight-line ETA estimation,
//! and the built-in / file-based hospital sets the resolver is built from.

pub mod providers;
pub mod resolver;
pub mod types;

pub use providers::{builtin_facilities, load_facilities_from, FacilityFileError};
pub use resolver::{estimate_eta, find_nearest, resolve, FacilityResolver, DEFAULT_SPEED_KMH};
pub use types::{Facility, ResolutionResult, ResolveError};
