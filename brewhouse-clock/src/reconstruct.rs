use brewhouse_protocol::api::StatusResponse;
use brewhouse_protocol::session::BrewingSession;
use chrono::{DateTime, Utc};

use crate::state::SessionPhase;
use crate::store::StoreError;

/// Result of rebuilding the timer from a status fetch. A failed fetch is
/// kept apart from "no session" so a transient error never zeroes a good
/// local timer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconstruction {
    Known {
        elapsed: u64,
        session: BrewingSession,
    },
    NoSession,
    Unknown,
}

/// Elapsed seconds implied by a session record at `now`.
pub fn reconstruct(session: &BrewingSession, now: DateTime<Utc>) -> u64 {
    match SessionPhase::from_session(session) {
        SessionPhase::Fermenting => session
            .fermentation_start_date
            .map(|started| seconds_between(started, now))
            .unwrap_or(0),
        SessionPhase::Brewing => {
            let since_start = session
                .start_date
                .map(|started| seconds_between(started, now))
                .unwrap_or(0);
            since_start.max(session.current_time)
        }
        SessionPhase::Paused => session.current_time,
        SessionPhase::NotStarted | SessionPhase::Completed => 0,
    }
}

pub fn reconstruct_status(
    result: Result<StatusResponse, StoreError>,
    now: DateTime<Utc>,
) -> Reconstruction {
    match result {
        Ok(status) if status.has_active_session => match status.into_session() {
            Some(session) => Reconstruction::Known {
                elapsed: reconstruct(&session, now),
                session,
            },
            None => Reconstruction::NoSession,
        },
        Ok(_) => Reconstruction::NoSession,
        Err(_) => Reconstruction::Unknown,
    }
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    let seconds = end.signed_duration_since(start).num_seconds();
    if seconds <= 0 {
        0
    } else {
        seconds as u64
    }
}
