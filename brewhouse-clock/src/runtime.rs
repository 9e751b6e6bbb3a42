use std::future::Future;
use std::sync::Arc;

use brewhouse_protocol::recipe::Recipe;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::{BrewSessionClock, TickOutcome};
use crate::config::ClockConfig;
use crate::error::ClockError;
use crate::reconstruct::Reconstruction;
use crate::store::SessionStore;

/// Owns the tick and poll tasks of a [`BrewSessionClock`].
///
/// At most one tick loop and one poll loop exist at a time; starting them
/// again aborts the previous pair.
pub struct ClockRuntime {
    clock: BrewSessionClock,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

impl ClockRuntime {
    pub fn new(clock: BrewSessionClock) -> Self {
        Self {
            clock,
            loops: Mutex::new(Vec::new()),
        }
    }

    /// Builds a clock, loads the session and starts the loops if it is
    /// running.
    pub async fn boot(recipe: Recipe, store: Arc<dyn SessionStore>, config: ClockConfig) -> Self {
        let runtime = Self::new(BrewSessionClock::new(recipe, store, config));
        runtime.reload().await;
        runtime
    }

    pub fn clock(&self) -> &BrewSessionClock {
        &self.clock
    }

    pub fn loops_running(&self) -> bool {
        self.loops.lock().iter().any(|handle| !handle.is_finished())
    }

    pub async fn reload(&self) -> Reconstruction {
        let reconstruction = self.clock.load().await;
        self.ensure_loops();
        reconstruction
    }

    pub fn ensure_loops(&self) {
        let mut loops = self.loops.lock();
        for handle in loops.drain(..) {
            handle.abort();
        }
        if !self.clock.phase().is_running() {
            return;
        }

        debug!(recipe_id = %self.clock.recipe_id(), "starting clock loops");
        loops.push(tokio::spawn(tick_loop(self.clock.clone())));
        loops.push(tokio::spawn(poll_loop(self.clock.clone())));
    }

    pub fn stop_loops(&self) {
        for handle in self.loops.lock().drain(..) {
            handle.abort();
        }
    }

    pub async fn start(&self) -> Result<(), ClockError> {
        self.clock.start().await?;
        self.ensure_loops();
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), ClockError> {
        self.clock.pause().await?;
        self.stop_loops();
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ClockError> {
        self.clock.resume().await?;
        self.ensure_loops();
        Ok(())
    }

    pub async fn complete_day(&self) -> Result<(), ClockError> {
        self.clock.complete_day().await?;
        self.ensure_loops();
        Ok(())
    }

    pub async fn complete_all(&self) -> Result<(), ClockError> {
        self.clock.complete_all().await?;
        self.stop_loops();
        Ok(())
    }

    /// Stops the loops and sends any pending measurement edit.
    pub async fn shutdown(self) {
        self.stop_loops();
        self.clock.flush_measurements().await;
        info!(recipe_id = %self.clock.recipe_id(), "brewing clock stopped");
    }
}

impl Drop for ClockRuntime {
    fn drop(&mut self) {
        self.stop_loops();
    }
}

/// Spawns `future` on the current tokio runtime, if there is one.
pub(crate) fn spawn_detached<F>(future: F) -> Option<JoinHandle<()>>
where
    F: Future<Output = ()> + Send + 'static,
{
    Handle::try_current()
        .ok()
        .map(|handle| handle.spawn(future))
}

async fn tick_loop(clock: BrewSessionClock) {
    let period = clock.config().tick_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match clock.tick() {
            TickOutcome::Advanced { .. } => {}
            TickOutcome::AutoPaused { .. } | TickOutcome::Idle => break,
        }
    }
    debug!(recipe_id = %clock.recipe_id(), elapsed = clock.elapsed(), "tick loop stopped");
}

async fn poll_loop(clock: BrewSessionClock) {
    let period = clock.config().sync_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !clock.phase().is_running() {
            break;
        }
        clock.reconcile().await;
    }
    debug!(recipe_id = %clock.recipe_id(), "poll loop stopped");
}
