use async_trait::async_trait;
use brewhouse_core::BrewhouseError;
use brewhouse_protocol::api::StatusResponse;
use brewhouse_protocol::measurements::MeasurementUpdate;
use brewhouse_protocol::session::{BrewingSession, SessionStatus};
use thiserror::Error;

/// Remote persistence of brewing sessions, keyed by recipe.
///
/// The clock only ever polls through this trait; a push-based transport can
/// be slotted in without touching the clock.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn status(&self, recipe_id: &str) -> Result<StatusResponse, StoreError>;

    async fn start(&self, recipe_id: &str) -> Result<BrewingSession, StoreError>;

    async fn pause(&self, recipe_id: &str) -> Result<BrewingSession, StoreError>;

    async fn resume(&self, recipe_id: &str) -> Result<BrewingSession, StoreError>;

    /// Ends the brew day (`Some(Fermenting)`) or the whole session (`None`).
    async fn complete(
        &self,
        recipe_id: &str,
        status: Option<SessionStatus>,
    ) -> Result<(), StoreError>;

    async fn complete_step(&self, recipe_id: &str, step_id: &str) -> Result<(), StoreError>;

    async fn uncomplete_step(&self, recipe_id: &str, step_id: &str) -> Result<(), StoreError>;

    async fn update_time(&self, recipe_id: &str, current_time: u64) -> Result<(), StoreError>;

    async fn update_gravity(
        &self,
        recipe_id: &str,
        update: &MeasurementUpdate,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid session store url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("session store request failed: {0}")]
    Http(String),
    #[error("session store returned {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("failed to decode session store response: {0}")]
    Decode(String),
}

impl From<StoreError> for BrewhouseError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidUrl { .. } => BrewhouseError::ConfigError(value.to_string()),
            StoreError::Decode(message) => BrewhouseError::DeserializationError(message),
            other => BrewhouseError::TransportError(other.to_string()),
        }
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;

    /// One call as seen by [`RecordingStore`].
    #[derive(Debug, Clone, PartialEq)]
    pub enum StoreCall {
        Status,
        Start,
        Pause,
        Resume,
        Complete(Option<SessionStatus>),
        CompleteStep(String),
        UncompleteStep(String),
        UpdateTime(u64),
        UpdateGravity(MeasurementUpdate),
    }

    /// In-memory store recording every call; status replies are scripted.
    #[derive(Clone, Default)]
    pub struct RecordingStore {
        calls: Arc<Mutex<Vec<StoreCall>>>,
        statuses: Arc<Mutex<VecDeque<Result<StatusResponse, StoreError>>>>,
        session: Arc<Mutex<BrewingSession>>,
        fail_commands: Arc<Mutex<bool>>,
        status_delay: Arc<Mutex<Option<Duration>>>,
    }

    impl RecordingStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_status(&self, status: Result<StatusResponse, StoreError>) {
            self.statuses.lock().push_back(status);
        }

        pub fn set_session(&self, session: BrewingSession) {
            *self.session.lock() = session;
        }

        /// Makes every later status call take `delay` to answer.
        pub fn delay_status(&self, delay: Duration) {
            *self.status_delay.lock() = Some(delay);
        }

        pub fn fail_commands(&self) {
            *self.fail_commands.lock() = true;
        }

        pub fn calls(&self) -> Vec<StoreCall> {
            self.calls.lock().clone()
        }

        pub fn gravity_updates(&self) -> Vec<MeasurementUpdate> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    StoreCall::UpdateGravity(update) => Some(update),
                    _ => None,
                })
                .collect()
        }

        fn record(&self, call: StoreCall) -> Result<(), StoreError> {
            self.calls.lock().push(call);
            if *self.fail_commands.lock() {
                Err(StoreError::Http("store offline".into()))
            } else {
                Ok(())
            }
        }

        fn session(&self) -> BrewingSession {
            self.session.lock().clone()
        }
    }

    #[async_trait]
    impl SessionStore for RecordingStore {
        async fn status(&self, _recipe_id: &str) -> Result<StatusResponse, StoreError> {
            self.calls.lock().push(StoreCall::Status);
            let delay = *self.status_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.statuses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(StatusResponse::inactive()))
        }

        async fn start(&self, _recipe_id: &str) -> Result<BrewingSession, StoreError> {
            self.record(StoreCall::Start)?;
            Ok(self.session())
        }

        async fn pause(&self, _recipe_id: &str) -> Result<BrewingSession, StoreError> {
            self.record(StoreCall::Pause)?;
            Ok(self.session())
        }

        async fn resume(&self, _recipe_id: &str) -> Result<BrewingSession, StoreError> {
            self.record(StoreCall::Resume)?;
            Ok(self.session())
        }

        async fn complete(
            &self,
            _recipe_id: &str,
            status: Option<SessionStatus>,
        ) -> Result<(), StoreError> {
            self.record(StoreCall::Complete(status))
        }

        async fn complete_step(&self, _recipe_id: &str, step_id: &str) -> Result<(), StoreError> {
            self.record(StoreCall::CompleteStep(step_id.to_string()))
        }

        async fn uncomplete_step(&self, _recipe_id: &str, step_id: &str) -> Result<(), StoreError> {
            self.record(StoreCall::UncompleteStep(step_id.to_string()))
        }

        async fn update_time(&self, _recipe_id: &str, current_time: u64) -> Result<(), StoreError> {
            self.record(StoreCall::UpdateTime(current_time))
        }

        async fn update_gravity(
            &self,
            _recipe_id: &str,
            update: &MeasurementUpdate,
        ) -> Result<(), StoreError> {
            self.record(StoreCall::UpdateGravity(update.clone()))
        }
    }
}
