use serde::{Deserialize, Serialize};

use crate::session::{BrewingSession, SessionStatus};

/// Reply to a status query. Older store builds name the record
/// `currentSession`, newer ones `activeSession`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    #[serde(default)]
    pub has_active_session: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_session: Option<BrewingSession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_session: Option<BrewingSession>,
}

impl StatusResponse {
    pub fn active(session: BrewingSession) -> Self {
        Self {
            has_active_session: true,
            active_session: Some(session),
            current_session: None,
        }
    }

    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&BrewingSession> {
        self.active_session
            .as_ref()
            .or(self.current_session.as_ref())
    }

    pub fn into_session(self) -> Option<BrewingSession> {
        self.active_session.or(self.current_session)
    }
}

/// Reply carrying the updated session after start/pause/resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub session: BrewingSession,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CompleteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeUpdate {
    pub current_time: u64,
}

/// Error body returned by the store on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
