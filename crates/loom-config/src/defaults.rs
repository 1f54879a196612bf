//! Built-in configuration defaults.

use crate::logging::LogFormat;

/// Log filter used when no layer sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned default log filter for serde and derive defaults.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default log output format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
