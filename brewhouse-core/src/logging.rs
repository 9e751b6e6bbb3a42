use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

use crate::errors::Result;

/// Initializes the default tracing subscriber used across the workspace.
pub fn init_tracing(level: Option<&str>) -> Result<()> {
    let default_level = level.unwrap_or("info");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stdout))
        .try_init()
        .map_err(|err| crate::errors::BrewhouseError::GeneralError(err.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn second_initialisation_reports_error() {
        let _ = init_tracing(Some("debug"));
        // Only one global subscriber can be installed per process.
        assert!(init_tracing(None).is_err());
    }
}
