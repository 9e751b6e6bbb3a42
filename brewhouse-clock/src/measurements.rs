use std::sync::Arc;
use std::time::Duration;

use brewhouse_protocol::measurements::MeasurementUpdate;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::runtime::spawn_detached;
use crate::state::SessionMirror;
use crate::store::SessionStore;

#[derive(Default)]
struct Pending {
    update: Option<MeasurementUpdate>,
    timer: Option<JoinHandle<()>>,
}

/// Trailing-edge debouncer for gravity, volume and notes edits.
///
/// Edits hit the mirror immediately; the store only sees the merged update
/// once the user stops typing, or on [`MeasurementSync::flush`].
#[derive(Clone)]
pub struct MeasurementSync {
    recipe_id: Arc<str>,
    store: Arc<dyn SessionStore>,
    mirror: Arc<RwLock<SessionMirror>>,
    pending: Arc<Mutex<Pending>>,
    gravity_delay: Duration,
    notes_delay: Duration,
}

impl MeasurementSync {
    pub fn new(
        recipe_id: &str,
        store: Arc<dyn SessionStore>,
        mirror: Arc<RwLock<SessionMirror>>,
        gravity_delay: Duration,
        notes_delay: Duration,
    ) -> Self {
        Self {
            recipe_id: Arc::from(recipe_id),
            store,
            mirror,
            pending: Arc::new(Mutex::new(Pending::default())),
            gravity_delay,
            notes_delay,
        }
    }

    /// Records an edit and restarts the debounce timer. ABV is always
    /// derived locally, so a caller-supplied value is dropped.
    ///
    /// The timer runs on the ambient tokio runtime. Without one the edit
    /// stays pending until [`MeasurementSync::flush`].
    pub fn edit(&self, mut update: MeasurementUpdate) {
        update.calculated_abv = None;
        if update.is_empty() {
            return;
        }

        let delay = if update.touches_notes() {
            self.notes_delay
        } else {
            self.gravity_delay
        };

        self.mirror.write().apply_measurements(update.clone());

        let mut pending = self.pending.lock();
        pending
            .update
            .get_or_insert_with(MeasurementUpdate::default)
            .merge(update);
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }

        let sync = self.clone();
        pending.timer = spawn_detached(async move {
            tokio::time::sleep(delay).await;
            if let Some(update) = sync.take_pending() {
                // Detached: aborting the timer must not cancel a request
                // that is already in flight.
                tokio::spawn(async move { sync.persist(update).await });
            }
        });
        if pending.timer.is_none() {
            debug!(recipe_id = %self.recipe_id, "no tokio runtime, edit held until flush");
        }
    }

    /// Sends any pending update now.
    pub async fn flush(&self) {
        let update = {
            let mut pending = self.pending.lock();
            if let Some(timer) = pending.timer.take() {
                timer.abort();
            }
            pending.update.take()
        };

        if let Some(update) = update {
            self.persist(self.with_abv(update)).await;
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().update.is_some()
    }

    fn take_pending(&self) -> Option<MeasurementUpdate> {
        let mut pending = self.pending.lock();
        pending.timer = None;
        pending.update.take().map(|update| self.with_abv(update))
    }

    fn with_abv(&self, mut update: MeasurementUpdate) -> MeasurementUpdate {
        let mirror = self.mirror.read();
        let values = &mirror.measurements;
        if values.original_gravity.is_some() && values.final_gravity.is_some() {
            update.calculated_abv = values.calculated_abv;
        }
        update
    }

    async fn persist(&self, update: MeasurementUpdate) {
        debug!(recipe_id = %self.recipe_id, ?update, "persisting measurements");
        if let Err(err) = self.store.update_gravity(&self.recipe_id, &update).await {
            warn!(recipe_id = %self.recipe_id, error = %err, "failed to persist measurements");
        }
    }
}
