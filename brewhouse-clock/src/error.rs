use thiserror::Error;

use crate::state::SessionPhase;

/// Errors surfaced synchronously by the clock. Store failures during
/// commands are logged, never returned.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error("cannot {action} while the session is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: SessionPhase,
    },
    #[error("no active brewing session")]
    NoActiveSession,
    #[error("invalid step: {0}")]
    Validation(#[from] ValidationError),
}

/// Step-entry problems caught before anything is sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("step id {0} uses the reserved process marker prefix")]
    ReservedId(String),
    #[error("step {step_id} at minute {time} is outside the boil window {start}..={end}")]
    OutsideBoilWindow {
        step_id: String,
        time: u32,
        start: u32,
        end: u32,
    },
    #[error("step {step_id} at minute {time} must be scheduled during fermentation")]
    NotFermentation { step_id: String, time: u32 },
    #[error("step {step_id} at minute {time} must come after the boil ends at minute {boil_end}")]
    BeforeBoilEnd {
        step_id: String,
        time: u32,
        boil_end: u32,
    },
    #[error("temperature change {0} needs a target temperature")]
    MissingTemperature(String),
}
