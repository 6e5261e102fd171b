//! Live tracking: the shared record, its single-slot store, and the two
//! roles that use it (ambulance session writes, dispatch watcher reads).

pub mod playback;
pub mod record;
pub mod session;
pub mod store;
pub mod watcher;

pub use playback::{smooth_move, RoutePlayback};
pub use record::TrackingRecord;
pub use session::{AmbulanceSession, LinePositionSource, PositionError, PositionSource, SessionError};
pub use store::{StoreError, TrackingStore};
pub use watcher::{PollOutcome, RenderState, Watcher};
