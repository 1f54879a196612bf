//! Layered configuration for the loom toolchain.
//!
//! Values are merged from built-in defaults, a TOML configuration file,
//! `LOOM_*` environment variables, and command-line flags, in increasing
//! order of precedence.

mod defaults;
mod logging;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for the `loom` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LOOM")]
pub struct Config {
    /// `tracing` filter expression, e.g. `info` or `loom::weave=debug`.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    log_filter: String,
    /// Output format for log events.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    log_format: LogFormat,
    /// Skips re-parsing bundles after each weave.
    #[serde(default)]
    #[ortho_config(default = false)]
    skip_syntax_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            skip_syntax_check: false,
        }
    }
}

impl Config {
    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for log events.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether each rewritten bundle is re-parsed before it is accepted.
    #[must_use]
    pub const fn verify_syntax(&self) -> bool {
        !self.skip_syntax_check
    }
}
