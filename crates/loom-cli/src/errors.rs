//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use camino::Utf8PathBuf;
use loom_core::{LoadCycleError, WeaveError};
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read {path}: {source}")]
    ReadTree { path: Utf8PathBuf, source: io::Error },
    #[error("failed to write {path}: {source}")]
    WriteTree { path: Utf8PathBuf, source: io::Error },
    #[error("file name under {parent} is not valid UTF-8: {name}")]
    NonUtf8Path { parent: Utf8PathBuf, name: String },
    #[error("failed to parse manifest {path}: {source}")]
    ParseManifest {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
    #[error("weaving failed: {0}")]
    Weave(#[from] LoadCycleError),
    #[error("cannot list targets: {0}")]
    Targets(#[from] WeaveError),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}
