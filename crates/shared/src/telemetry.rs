//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber filtered by
//! [`LoggingSettings::filter`]. Safe to call more than once; later calls keep
//! the subscriber that is already installed.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install the global subscriber. Returns false when one was already set.
pub fn init(settings: &LoggingSettings) -> bool {
    let filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
