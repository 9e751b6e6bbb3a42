use brewhouse_protocol::recipe::RecipeStep;

use crate::state::SessionPhase;

/// Notifications published by the clock. Sending never blocks; receivers
/// that lag simply miss events.
#[derive(Debug, Clone, PartialEq)]
pub enum ClockEvent {
    Tick { elapsed: u64 },
    StepAlert { step: RecipeStep },
    AutoPaused { step: RecipeStep, elapsed: u64 },
    PhaseChanged { from: SessionPhase, to: SessionPhase },
    DriftCorrected { local: u64, remote: u64 },
}
