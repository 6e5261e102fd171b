//! Dispatch-side watcher: polls the shared slot and keeps a render state.
//!
//! Tick flow:  read slot → skip if empty/malformed/unchanged/older `seq` → move markers
//!             → use pre-fetched route, else ask the routing service

use std::future::Future;
use std::time::Duration;

use crate::facility::Facility;
use crate::geo::GeoPoint;
use crate::routing::RouteProvider;

use super::playback::{smooth_move, RoutePlayback};
use super::record::TrackingRecord;
use super::store::TrackingStore;

/// Everything a map view needs to draw the current tick.
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    pub ambulance: Option<GeoPoint>,
    pub hospital: Option<Facility>,
    /// Route polyline; kept from the last good fetch when a fetch fails.
    pub route: Vec<GeoPoint>,
    /// Intermediate marker positions for the latest move.
    pub frames: Vec<GeoPoint>,
    pub info: Option<String>,
    /// Straight-line ETA from the record.
    pub eta_minutes: Option<f64>,
    /// Travel time reported by the routing service for the current route.
    pub route_eta_minutes: Option<f64>,
}

impl RenderState {
    pub fn playback(&self) -> RoutePlayback {
        RoutePlayback::new(self.route.clone())
    }
}

/// What one poll did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No (readable) record in the slot.
    Empty,
    /// Same record as the last tick, or an older `seq` than the one shown.
    Unchanged,
    /// New record rendered, route in place.
    Updated { seq: u64 },
    /// New record rendered but the route could not be fetched.
    RouteFailed { seq: u64 },
}

pub struct Watcher<P> {
    store: TrackingStore,
    provider: P,
    state: RenderState,
    last_record: Option<TrackingRecord>,
    route_pending: bool,
    smooth_steps: usize,
}

impl<P: RouteProvider> Watcher<P> {
    pub fn new(store: TrackingStore, provider: P) -> Self {
        Self {
            store,
            provider,
            state: RenderState::default(),
            last_record: None,
            route_pending: false,
            smooth_steps: 0,
        }
    }

    /// Animate marker moves over `steps` frames instead of jumping.
    pub fn with_smooth_steps(mut self, steps: usize) -> Self {
        self.smooth_steps = steps;
        self
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn poll_once(&mut self) -> PollOutcome {
        let record = match self.store.read() {
            Some(r) => r,
            None => {
                // A cleared slot restarts numbering for the next writer.
                self.last_record = None;
                self.route_pending = false;
                return PollOutcome::Empty;
            }
        };
        let checked = record
            .position()
            .and_then(|p| record.hospital_location().map(|h| (p, h)));
        let (position, destination) = match checked {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(error = %e, "tracking record has bad coordinates, skipping tick");
                return PollOutcome::Empty;
            }
        };

        let last_seq = self.last_record.as_ref().map_or(0, |r| r.seq);
        if record.seq != 0 && last_seq != 0 {
            if record.seq < last_seq {
                tracing::debug!(seq = record.seq, last_seq, "stale record in slot, ignoring");
                return PollOutcome::Unchanged;
            }
            if record.seq == last_seq {
                if !self.route_pending {
                    return PollOutcome::Unchanged;
                }
                return self.refresh_route(&record, position, destination);
            }
        } else if self.last_record.as_ref() == Some(&record) {
            // Writers that do not stamp `seq` are compared by content.
            if !self.route_pending {
                return PollOutcome::Unchanged;
            }
            return self.refresh_route(&record, position, destination);
        }

        let from = self.state.ambulance.unwrap_or(position);
        self.state.frames = smooth_move(from, position, self.smooth_steps);
        self.state.ambulance = Some(position);
        self.state.hospital = Some(record.hospital.clone());
        self.state.info = Some(record.info_panel());
        self.state.eta_minutes = record.eta.parse().ok();

        let outcome = self.refresh_route(&record, position, destination);
        self.last_record = Some(record);
        outcome
    }

    fn refresh_route(&mut self, record: &TrackingRecord, position: GeoPoint, destination: GeoPoint) -> PollOutcome {
        let seq = record.seq;

        if let Some(path) = record.route_points() {
            self.state.route = path;
            self.state.route_eta_minutes = None;
            self.route_pending = false;
            return PollOutcome::Updated { seq };
        }

        match self.provider.route(position, destination) {
            Ok(route) => {
                self.state.route_eta_minutes = route.duration_minutes();
                self.state.route = route.path;
                self.route_pending = false;
                PollOutcome::Updated { seq }
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "route fetch failed, keeping previous route");
                self.route_pending = true;
                PollOutcome::RouteFailed { seq }
            }
        }
    }

    /// Poll every `interval` until `shutdown` resolves, handing each
    /// rendering tick to `on_tick`.
    ///
    /// Routing calls block, so this needs the multi-threaded runtime.
    pub async fn run_until<F, T>(&mut self, interval: Duration, shutdown: F, mut on_tick: T)
    where
        F: Future<Output = ()>,
        T: FnMut(&RenderState, PollOutcome),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let outcome = tokio::task::block_in_place(|| self.poll_once());
                    tracing::debug!(?outcome, "poll");
                    if matches!(outcome, PollOutcome::Updated { .. } | PollOutcome::RouteFailed { .. }) {
                        on_tick(&self.state, outcome);
                    }
                }
            }
        }
    }
}
