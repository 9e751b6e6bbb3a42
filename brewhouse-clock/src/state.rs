use std::collections::HashSet;
use std::fmt;

use brewhouse_protocol::measurements::{calculate_abv, MeasurementUpdate};
use brewhouse_protocol::session::{BrewingSession, SessionStatus};
use serde::{Deserialize, Serialize};

use crate::error::ClockError;

/// Lifecycle of a brewing session as seen by the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    Brewing,
    Paused,
    Fermenting,
    Completed,
}

impl SessionPhase {
    /// Collapses the store's status + boolean pair into one phase.
    pub fn from_session(session: &BrewingSession) -> Self {
        match session.status {
            SessionStatus::NotStarted => SessionPhase::NotStarted,
            SessionStatus::Completed => SessionPhase::Completed,
            SessionStatus::Fermenting => SessionPhase::Fermenting,
            SessionStatus::Brewing if session.is_running && !session.is_paused => {
                SessionPhase::Brewing
            }
            SessionStatus::Brewing => SessionPhase::Paused,
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self {
            SessionPhase::NotStarted => SessionStatus::NotStarted,
            SessionPhase::Brewing | SessionPhase::Paused => SessionStatus::Brewing,
            SessionPhase::Fermenting => SessionStatus::Fermenting,
            SessionPhase::Completed => SessionStatus::Completed,
        }
    }

    /// Whether local time advances in this phase.
    pub fn is_running(&self) -> bool {
        matches!(self, SessionPhase::Brewing | SessionPhase::Fermenting)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, SessionPhase::Paused)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionPhase::Brewing | SessionPhase::Paused | SessionPhase::Fermenting
        )
    }

    pub fn start(self) -> Result<Self, ClockError> {
        match self {
            SessionPhase::NotStarted => Ok(SessionPhase::Brewing),
            phase => Err(invalid("start", phase)),
        }
    }

    pub fn pause(self) -> Result<Self, ClockError> {
        match self {
            SessionPhase::Brewing => Ok(SessionPhase::Paused),
            phase => Err(invalid("pause", phase)),
        }
    }

    pub fn resume(self) -> Result<Self, ClockError> {
        match self {
            SessionPhase::Paused => Ok(SessionPhase::Brewing),
            phase => Err(invalid("resume", phase)),
        }
    }

    pub fn complete_day(self) -> Result<Self, ClockError> {
        match self {
            SessionPhase::Brewing | SessionPhase::Paused => Ok(SessionPhase::Fermenting),
            phase => Err(invalid("complete the brew day", phase)),
        }
    }

    pub fn complete_all(self) -> Result<Self, ClockError> {
        match self {
            SessionPhase::Fermenting => Ok(SessionPhase::Completed),
            phase => Err(invalid("complete the session", phase)),
        }
    }
}

fn invalid(action: &'static str, phase: SessionPhase) -> ClockError {
    ClockError::InvalidTransition { action, phase }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionPhase::NotStarted => "not started",
            SessionPhase::Brewing => "brewing",
            SessionPhase::Paused => "paused",
            SessionPhase::Fermenting => "fermenting",
            SessionPhase::Completed => "completed",
        };
        f.write_str(label)
    }
}

/// Locally cached mirror of the remote session, owned by the clock.
#[derive(Debug, Clone, Default)]
pub struct SessionMirror {
    pub phase: SessionPhase,
    /// Seconds on the local timer.
    pub elapsed: u64,
    pub has_active_session: bool,
    pub completed_steps: HashSet<String>,
    /// Current measurement values, including optimistic edits.
    pub measurements: MeasurementUpdate,
    /// Last record received from the store.
    pub session: Option<BrewingSession>,
}

impl SessionMirror {
    pub fn from_session(session: BrewingSession, elapsed: u64) -> Self {
        Self {
            phase: SessionPhase::from_session(&session),
            elapsed,
            has_active_session: true,
            completed_steps: session.completed_step_ids(),
            measurements: MeasurementUpdate {
                original_gravity: session.original_gravity,
                final_gravity: session.final_gravity,
                calculated_abv: session.calculated_abv,
                batch_liters: session.batch_liters,
                batch_notes: session.batch_notes.clone(),
            },
            session: Some(session),
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.phase.is_paused()
    }

    /// Applies an edit to the cached values and re-derives ABV.
    pub fn apply_measurements(&mut self, update: MeasurementUpdate) {
        self.measurements.merge(update);
        if let (Some(og), Some(fg)) = (
            self.measurements.original_gravity,
            self.measurements.final_gravity,
        ) {
            self.measurements.calculated_abv = Some(calculate_abv(og, fg));
        }
    }

    /// Takes timestamps and identity from a store reply without touching
    /// local time, phase or measurements.
    pub fn merge_remote_timestamps(&mut self, remote: &BrewingSession) {
        let cached = self.session.get_or_insert_with(BrewingSession::default);
        if !remote.session_id.is_empty() {
            cached.session_id = remote.session_id.clone();
        }
        if remote.start_date.is_some() {
            cached.start_date = remote.start_date;
        }
        if remote.fermentation_start_date.is_some() {
            cached.fermentation_start_date = remote.fermentation_start_date;
        }
    }
}
