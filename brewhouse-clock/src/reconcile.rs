use brewhouse_protocol::api::StatusResponse;
use brewhouse_protocol::session::{BrewingSession, SessionStatus};
use chrono::{DateTime, Utc};

use crate::reconstruct::reconstruct;
use crate::state::{SessionMirror, SessionPhase};

/// What a reconciliation pass changed in the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub phase_change: Option<(SessionPhase, SessionPhase)>,
    pub drift_correction: Option<(u64, u64)>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.phase_change.is_none() && self.drift_correction.is_none()
    }
}

/// Applies a status pull to the mirror. The store wins on status; local
/// time wins unless it drifted more than `drift_threshold` seconds.
pub fn reconcile(
    mirror: &mut SessionMirror,
    remote: &StatusResponse,
    now: DateTime<Utc>,
    drift_threshold: u64,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let session = remote_session(remote);
    let remote_phase = session
        .map(SessionPhase::from_session)
        .unwrap_or(SessionPhase::NotStarted);

    mirror.has_active_session = remote.has_active_session;

    if remote_phase != mirror.phase {
        outcome.phase_change = Some((mirror.phase, remote_phase));
        mirror.phase = remote_phase;
        if !matches!(remote_phase, SessionPhase::Brewing | SessionPhase::Paused) {
            mirror.elapsed = session.map(|s| reconstruct(s, now)).unwrap_or(0);
            if let Some(session) = session {
                mirror.merge_remote_timestamps(session);
            }
            return outcome;
        }
    }

    let Some(session) = session else {
        return outcome;
    };
    mirror.merge_remote_timestamps(session);

    let remote_elapsed = match remote_phase {
        SessionPhase::Fermenting => reconstruct(session, now),
        _ => session.current_time,
    };
    if remote_elapsed.abs_diff(mirror.elapsed) > drift_threshold {
        outcome.drift_correction = Some((mirror.elapsed, remote_elapsed));
        mirror.elapsed = remote_elapsed;
    }

    outcome
}

/// The record to reconcile against: the active session, or a completed one
/// the store still reports after it went inactive.
fn remote_session(remote: &StatusResponse) -> Option<&BrewingSession> {
    let session = remote.session()?;
    if remote.has_active_session || session.status == SessionStatus::Completed {
        Some(session)
    } else {
        None
    }
}
