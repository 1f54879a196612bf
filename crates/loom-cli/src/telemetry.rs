//! Structured logging for the `loom` binary.
//!
//! Events go to stderr so that stdout carries only command output.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;

use loom_config::{Config, LogFormat};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Errors raised while installing the log subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid directive list.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Filter as configured.
        filter: String,
        /// Parser complaint.
        message: String,
    },
    /// Another global subscriber got there first.
    #[error("cannot install log subscriber: {0}")]
    Install(String),
}

/// Installs the global subscriber once per process.
///
/// Later calls keep the subscriber from the first one.
///
/// # Errors
///
/// Fails on an invalid filter or when a foreign subscriber is already set.
pub fn initialise(config: &Config) -> Result<(), TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install(config).map(|()| config.log_format()))
        .map(|_| ())
}

fn install(config: &Config) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|err| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            message: err.to_string(),
        })?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let installed = match config.log_format() {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|err| TelemetryError::Install(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialisation_keeps_the_first_subscriber() {
        let config = Config::default();
        initialise(&config).expect("first initialisation");
        initialise(&config).expect("second initialisation is a no-op");
        assert!(INSTALLED.get().is_some());
    }
}
