//! Brewhouse: brewing-session clock for the brewery back-office.
//!
//! The workspace is split into three crates:
//!
//! * `brewhouse_core`: configuration, canonical errors and logging setup
//! * `brewhouse_protocol`: session, recipe and measurement records shared with the store
//! * `brewhouse_clock`: the session clock, its background loops and the store transport

use std::sync::Arc;

use tracing::info;

pub use brewhouse_clock;
pub use brewhouse_core;
pub use brewhouse_protocol;

pub use brewhouse_clock::{
    BrewSessionClock, ClockConfig, ClockError, ClockEvent, ClockRuntime, HttpSessionStore,
    Reconstruction, SessionPhase, SessionStore,
};
pub use brewhouse_core::config::load_config;
pub use brewhouse_core::logging::init_tracing;
pub use brewhouse_core::{BrewhouseConfig, BrewhouseError};
pub use brewhouse_protocol::prelude::*;

/// Boots a clock for `recipe` against the HTTP session store described by
/// `config`.
pub async fn boot_clock(recipe: Recipe, config: &BrewhouseConfig) -> anyhow::Result<ClockRuntime> {
    let store = HttpSessionStore::from_config(config)?;
    info!(
        api_url = %config.api_url(),
        recipe_id = %recipe.id,
        production = config.is_production(),
        "booting brewing clock"
    );
    Ok(ClockRuntime::boot(recipe, Arc::new(store), ClockConfig::from(config)).await)
}

/// Same as [`boot_clock`], reading configuration from `BREWHOUSE_*`
/// environment variables.
pub async fn boot_clock_from_env(recipe: Recipe) -> anyhow::Result<ClockRuntime> {
    let config = load_config()?;
    boot_clock(recipe, &config).await
}
