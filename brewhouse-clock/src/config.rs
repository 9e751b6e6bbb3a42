use std::time::Duration;

use brewhouse_core::BrewhouseConfig;
use serde::{Deserialize, Serialize};

/// Cadences and thresholds of the clock's timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    /// Remote/local differences up to this many seconds are left alone.
    #[serde(default = "default_drift_threshold_secs")]
    pub drift_threshold_secs: u64,
    #[serde(default = "default_gravity_debounce_ms")]
    pub gravity_debounce_ms: u64,
    #[serde(default = "default_notes_debounce_ms")]
    pub notes_debounce_ms: u64,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_sync_interval_secs() -> u64 {
    30
}

fn default_drift_threshold_secs() -> u64 {
    30
}

fn default_gravity_debounce_ms() -> u64 {
    500
}

fn default_notes_debounce_ms() -> u64 {
    1_500
}

fn default_event_capacity() -> usize {
    64
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            sync_interval_secs: default_sync_interval_secs(),
            drift_threshold_secs: default_drift_threshold_secs(),
            gravity_debounce_ms: default_gravity_debounce_ms(),
            notes_debounce_ms: default_notes_debounce_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }

    pub fn gravity_debounce(&self) -> Duration {
        Duration::from_millis(self.gravity_debounce_ms)
    }

    pub fn notes_debounce(&self) -> Duration {
        Duration::from_millis(self.notes_debounce_ms)
    }
}

impl From<&BrewhouseConfig> for ClockConfig {
    fn from(config: &BrewhouseConfig) -> Self {
        Self {
            sync_interval_secs: config.sync_interval_secs,
            drift_threshold_secs: config.drift_threshold_secs,
            ..Self::default()
        }
    }
}
