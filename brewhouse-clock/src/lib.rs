//! Brewing-session clock.
//!
//! Keeps a local mirror of the remote session, advances it once per second,
//! raises step alerts, pauses on temperature-sensitive steps and keeps the
//! mirror in line with the [`SessionStore`].

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod http_store;
pub mod measurements;
pub mod reconcile;
pub mod reconstruct;
pub mod runtime;
pub mod schedule;
pub mod state;
pub mod store;

pub use clock::{BrewSessionClock, TickOutcome};
pub use config::ClockConfig;
pub use error::{ClockError, ValidationError};
pub use events::ClockEvent;
pub use http_store::HttpSessionStore;
pub use measurements::MeasurementSync;
pub use reconcile::{reconcile, ReconcileOutcome};
pub use reconstruct::{reconstruct, reconstruct_status, Reconstruction};
pub use runtime::ClockRuntime;
pub use schedule::{check_for_auto_pause, validate_step, AutoPause};
pub use state::{SessionMirror, SessionPhase};
pub use store::{SessionStore, StoreError};
