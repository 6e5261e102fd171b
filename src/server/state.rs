use std::sync::{Mutex, MutexGuard};

use chrono_tz::Tz;

use crate::facility::FacilityResolver;
use crate::tracking::TrackingStore;

pub struct AppState {
    pub resolver: FacilityResolver,
    pub store: Mutex<TrackingStore>,
    pub tz: Tz,
}

impl AppState {
    pub fn new(resolver: FacilityResolver, store: TrackingStore, tz: Tz) -> Self {
        Self { resolver, store: Mutex::new(store), tz }
    }

    /// The store lock. A panicked writer leaves at worst a stale slot, so
    /// poisoning is ignored.
    pub fn store(&self) -> MutexGuard<'_, TrackingStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
