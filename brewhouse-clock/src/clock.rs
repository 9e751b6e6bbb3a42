use std::sync::Arc;

use brewhouse_protocol::measurements::MeasurementUpdate;
use brewhouse_protocol::recipe::{Recipe, RecipeStep};
use brewhouse_protocol::session::{BrewingSession, SessionStatus};
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ClockConfig;
use crate::error::ClockError;
use crate::events::ClockEvent;
use crate::measurements::MeasurementSync;
use crate::reconcile::ReconcileOutcome;
use crate::reconstruct::{reconstruct_status, Reconstruction};
use crate::runtime::spawn_detached;
use crate::schedule::{self, check_for_auto_pause, steps_due_on_tick};
use crate::state::{SessionMirror, SessionPhase};
use crate::store::SessionStore;

/// What a single one-second tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The session is not running; nothing changed.
    Idle,
    Advanced {
        elapsed: u64,
        alerts: Vec<RecipeStep>,
    },
    /// A temperature-sensitive step came due and the clock paused itself.
    AutoPaused { elapsed: u64, step: RecipeStep },
}

/// Timer of one recipe's brewing session.
///
/// Cheap to clone; all clones share the same mirror, store and event
/// channel. The background loops live in [`crate::runtime::ClockRuntime`].
#[derive(Clone)]
pub struct BrewSessionClock {
    recipe: Arc<Recipe>,
    store: Arc<dyn SessionStore>,
    mirror: Arc<RwLock<SessionMirror>>,
    events: broadcast::Sender<ClockEvent>,
    measurements: MeasurementSync,
    config: ClockConfig,
}

impl BrewSessionClock {
    pub fn new(recipe: Recipe, store: Arc<dyn SessionStore>, config: ClockConfig) -> Self {
        let mirror = Arc::new(RwLock::new(SessionMirror::default()));
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let measurements = MeasurementSync::new(
            &recipe.id,
            store.clone(),
            mirror.clone(),
            config.gravity_debounce(),
            config.notes_debounce(),
        );

        Self {
            recipe: Arc::new(recipe),
            store,
            mirror,
            events,
            measurements,
            config,
        }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe.id
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClockEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SessionMirror {
        self.mirror.read().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.mirror.read().phase
    }

    pub fn elapsed(&self) -> u64 {
        self.mirror.read().elapsed
    }

    /// Fetches the session and rebuilds the local timer from it.
    ///
    /// A failed fetch yields [`Reconstruction::Unknown`] and keeps whatever
    /// the mirror already holds.
    pub async fn load(&self) -> Reconstruction {
        let result = self.store.status(&self.recipe.id).await;
        if let Err(err) = &result {
            warn!(recipe_id = %self.recipe.id, error = %err, "failed to load brewing session");
        }

        let reconstruction = reconstruct_status(result, Utc::now());
        match &reconstruction {
            Reconstruction::Known { elapsed, session } => self.adopt(session, *elapsed),
            Reconstruction::NoSession => {
                let from = {
                    let mut mirror = self.mirror.write();
                    let from = mirror.phase;
                    *mirror = SessionMirror::default();
                    from
                };
                debug!(recipe_id = %self.recipe.id, "no active brewing session");
                self.publish_phase_change(from, SessionPhase::NotStarted);
            }
            Reconstruction::Unknown => {}
        }
        reconstruction
    }

    fn adopt(&self, session: &BrewingSession, elapsed: u64) {
        let mut fresh = SessionMirror::from_session(session.clone(), elapsed);
        let auto_pause = if fresh.phase == SessionPhase::Brewing {
            check_for_auto_pause(&self.recipe, fresh.elapsed, &fresh.completed_steps)
        } else {
            None
        };
        if let Some(pause) = &auto_pause {
            fresh.elapsed = pause.pause_at_seconds;
            fresh.phase = SessionPhase::Paused;
        }

        let to = fresh.phase;
        let from = {
            let mut mirror = self.mirror.write();
            let from = mirror.phase;
            *mirror = fresh;
            from
        };

        info!(
            recipe_id = %self.recipe.id,
            phase = %to,
            elapsed,
            "brewing session loaded"
        );
        self.publish_phase_change(from, to);

        if let Some(pause) = auto_pause {
            info!(
                recipe_id = %self.recipe.id,
                step_id = %pause.trigger_step.id,
                elapsed = pause.pause_at_seconds,
                "rolled back to pending temperature step"
            );
            self.publish(ClockEvent::AutoPaused {
                step: pause.trigger_step,
                elapsed: pause.pause_at_seconds,
            });
            self.persist_pause(pause.pause_at_seconds);
        }
    }

    /// Advances the timer by one second and raises alerts for steps whose
    /// minute was just entered.
    ///
    /// Store pushes triggered by an auto-pause run on the ambient tokio
    /// runtime. Called outside one, the local pause still happens and the
    /// push is skipped with a warning; the next command or poll resyncs.
    pub fn tick(&self) -> TickOutcome {
        let (elapsed, alerts, paused_by) = {
            let mut mirror = self.mirror.write();
            if !mirror.phase.is_running() {
                return TickOutcome::Idle;
            }

            let previous = mirror.elapsed;
            mirror.elapsed += 1;
            // Fermentation counts from its own start date, so brew-day
            // minutes are only meaningful while brewing.
            let alerts = if mirror.phase == SessionPhase::Brewing {
                steps_due_on_tick(
                    &self.recipe,
                    previous,
                    mirror.elapsed,
                    &mirror.completed_steps,
                )
            } else {
                Vec::new()
            };
            let paused_by = alerts
                .iter()
                .find(|step| step.is_temperature_sensitive())
                .cloned();
            if paused_by.is_some() {
                mirror.phase = SessionPhase::Paused;
            }
            (mirror.elapsed, alerts, paused_by)
        };

        self.publish(ClockEvent::Tick { elapsed });
        for step in &alerts {
            info!(recipe_id = %self.recipe.id, step_id = %step.id, elapsed, "step due");
            self.publish(ClockEvent::StepAlert { step: step.clone() });
        }

        match paused_by {
            Some(step) => {
                info!(recipe_id = %self.recipe.id, step_id = %step.id, elapsed, "auto-paused");
                self.publish_phase_change(SessionPhase::Brewing, SessionPhase::Paused);
                self.publish(ClockEvent::AutoPaused {
                    step: step.clone(),
                    elapsed,
                });
                self.persist_pause(elapsed);
                TickOutcome::AutoPaused { elapsed, step }
            }
            None => TickOutcome::Advanced { elapsed, alerts },
        }
    }

    /// Pushes local time, then pulls status and adopts whatever diverged.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        let (phase, elapsed) = {
            let mirror = self.mirror.read();
            (mirror.phase, mirror.elapsed)
        };
        if phase == SessionPhase::Brewing {
            self.spawn_time_push(elapsed);
        }

        let remote = match self.store.status(&self.recipe.id).await {
            Ok(remote) => remote,
            Err(err) => {
                warn!(recipe_id = %self.recipe.id, error = %err, "status poll failed");
                return ReconcileOutcome::default();
            }
        };

        let outcome = {
            let mut mirror = self.mirror.write();
            if mirror.phase != phase {
                // A tick or command moved the phase while the poll was in
                // flight; the reply predates that change.
                debug!(
                    recipe_id = %self.recipe.id,
                    polled = %phase,
                    current = %mirror.phase,
                    "discarding stale status"
                );
                return ReconcileOutcome::default();
            }
            crate::reconcile::reconcile(
                &mut mirror,
                &remote,
                Utc::now(),
                self.config.drift_threshold_secs,
            )
        };

        if let Some((from, to)) = outcome.phase_change {
            info!(recipe_id = %self.recipe.id, %from, %to, "adopted remote phase");
            self.publish_phase_change(from, to);
        }
        if let Some((local, remote)) = outcome.drift_correction {
            info!(recipe_id = %self.recipe.id, local, remote, "corrected timer drift");
            self.publish(ClockEvent::DriftCorrected { local, remote });
        }
        outcome
    }

    pub async fn start(&self) -> Result<(), ClockError> {
        self.transition(SessionPhase::start, |mirror| {
            mirror.elapsed = 0;
            mirror.has_active_session = true;
            mirror.completed_steps.clear();
            mirror.measurements = MeasurementUpdate::default();
            mirror.session = None;
        })?;

        match self.store.start(&self.recipe.id).await {
            Ok(session) => self.mirror.write().merge_remote_timestamps(&session),
            Err(err) => self.log_store_failure("start", &err),
        }
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), ClockError> {
        let elapsed = self.transition(SessionPhase::pause, |_| {})?;

        if let Err(err) = self.store.update_time(&self.recipe.id, elapsed).await {
            self.log_store_failure("update time", &err);
        }
        match self.store.pause(&self.recipe.id).await {
            Ok(session) => self.mirror.write().merge_remote_timestamps(&session),
            Err(err) => self.log_store_failure("pause", &err),
        }
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ClockError> {
        self.transition(SessionPhase::resume, |_| {})?;

        match self.store.resume(&self.recipe.id).await {
            Ok(session) => self.mirror.write().merge_remote_timestamps(&session),
            Err(err) => self.log_store_failure("resume", &err),
        }
        Ok(())
    }

    /// Ends the brew day; the timer restarts at zero for fermentation.
    pub async fn complete_day(&self) -> Result<(), ClockError> {
        self.transition(SessionPhase::complete_day, |mirror| {
            mirror.elapsed = 0;
            let session = mirror
                .session
                .get_or_insert_with(BrewingSession::default);
            session.status = SessionStatus::Fermenting;
            session.fermentation_start_date = Some(Utc::now());
        })?;

        if let Err(err) = self
            .store
            .complete(&self.recipe.id, Some(SessionStatus::Fermenting))
            .await
        {
            self.log_store_failure("complete brew day", &err);
        }
        Ok(())
    }

    pub async fn complete_all(&self) -> Result<(), ClockError> {
        self.transition(SessionPhase::complete_all, |mirror| {
            mirror.has_active_session = false;
        })?;

        if let Err(err) = self.store.complete(&self.recipe.id, None).await {
            self.log_store_failure("complete session", &err);
        }
        Ok(())
    }

    /// Flips a step's completion. Returns whether the step is now completed.
    pub async fn toggle_step(&self, step_id: &str) -> Result<bool, ClockError> {
        let completed = {
            let mut mirror = self.mirror.write();
            if !mirror.has_active_session {
                return Err(ClockError::NoActiveSession);
            }
            if mirror.completed_steps.remove(step_id) {
                if let Some(session) = mirror.session.as_mut() {
                    session.unmark_step_completed(step_id);
                }
                false
            } else {
                mirror.completed_steps.insert(step_id.to_string());
                if let Some(session) = mirror.session.as_mut() {
                    session.mark_step_completed(step_id, Utc::now());
                }
                true
            }
        };

        let result = if completed {
            self.store.complete_step(&self.recipe.id, step_id).await
        } else {
            self.store.uncomplete_step(&self.recipe.id, step_id).await
        };
        if let Err(err) = result {
            self.log_store_failure("toggle step", &err);
        }
        debug!(recipe_id = %self.recipe.id, step_id, completed, "step toggled");
        Ok(completed)
    }

    pub fn validate_step(&self, step: &RecipeStep) -> Result<(), ClockError> {
        schedule::validate_step(&self.recipe, step)?;
        Ok(())
    }

    pub fn edit_measurements(&self, update: MeasurementUpdate) {
        self.measurements.edit(update);
    }

    pub async fn flush_measurements(&self) {
        self.measurements.flush().await;
    }

    /// Applies a checked phase change to the mirror and announces it.
    /// Returns the elapsed seconds at the moment of the change.
    fn transition<F>(
        &self,
        next: impl FnOnce(SessionPhase) -> Result<SessionPhase, ClockError>,
        apply: F,
    ) -> Result<u64, ClockError>
    where
        F: FnOnce(&mut SessionMirror),
    {
        let (from, to, elapsed) = {
            let mut mirror = self.mirror.write();
            let from = mirror.phase;
            let to = next(from)?;
            mirror.phase = to;
            apply(&mut mirror);
            (from, to, mirror.elapsed)
        };

        info!(recipe_id = %self.recipe.id, %from, %to, elapsed, "session phase changed");
        self.publish_phase_change(from, to);
        Ok(elapsed)
    }

    fn persist_pause(&self, elapsed: u64) {
        let store = self.store.clone();
        let recipe_id = self.recipe.id.clone();
        let spawned = spawn_detached(async move {
            if let Err(err) = store.update_time(&recipe_id, elapsed).await {
                warn!(recipe_id = %recipe_id, error = %err, "failed to push paused time");
            }
            if let Err(err) = store.pause(&recipe_id).await {
                warn!(recipe_id = %recipe_id, error = %err, "failed to persist auto-pause");
            }
        });
        if spawned.is_none() {
            warn!(recipe_id = %self.recipe.id, elapsed, "no tokio runtime, auto-pause not persisted");
        }
    }

    fn spawn_time_push(&self, elapsed: u64) {
        let store = self.store.clone();
        let recipe_id = self.recipe.id.clone();
        let spawned = spawn_detached(async move {
            if let Err(err) = store.update_time(&recipe_id, elapsed).await {
                warn!(recipe_id = %recipe_id, error = %err, "failed to push current time");
            }
        });
        if spawned.is_none() {
            warn!(recipe_id = %self.recipe.id, elapsed, "no tokio runtime, time push skipped");
        }
    }

    fn publish_phase_change(&self, from: SessionPhase, to: SessionPhase) {
        if from != to {
            self.publish(ClockEvent::PhaseChanged { from, to });
        }
    }

    fn publish(&self, event: ClockEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn log_store_failure(&self, action: &str, err: &crate::store::StoreError) {
        warn!(recipe_id = %self.recipe.id, action, error = %err, "session store call failed; keeping local state");
    }
}
