//! Error types for weave construction and application.
//!
//! Every failure is raised synchronously at registration time and is fatal to
//! that registration: a weave is either rebound in full or not at all.

use camino::Utf8PathBuf;
use loom_syntax::SyntaxError;
use thiserror::Error;

use crate::description::ModeTag;

/// Errors from building or applying weaves.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WeaveError {
    /// Function text could not be split into parameters and body.
    #[error("malformed function source: {message}")]
    MalformedSource {
        /// What was missing or out of order.
        message: String,
    },

    /// Neither literal code nor a callback was supplied.
    #[error("weave for '{target}' supplies neither code nor a callback")]
    ContentMissing {
        /// Method or function the weave was meant for.
        target: String,
    },

    /// The insertion mode tag is not HEAD, TAIL, or an INSERT record.
    #[error("invalid insertion mode: {message}")]
    InvalidInsertionMode {
        /// Description of the rejected tag.
        message: String,
    },

    /// A weave was handed to the applier for a different mode.
    #[error("{expected} applier cannot apply a {found} weave")]
    ModeMismatch {
        /// Mode the applier handles.
        expected: ModeTag,
        /// Mode the weave declares.
        found: ModeTag,
    },

    /// The target binding path does not resolve to a function.
    #[error("'{target}' does not resolve to a function in {bundle}")]
    TargetNotFound {
        /// Binding path that was looked up.
        target: String,
        /// Bundle that was searched.
        bundle: Utf8PathBuf,
    },

    /// The target binding path resolves to more than one function.
    #[error("'{target}' resolves to {count} functions in {bundle}")]
    AmbiguousTarget {
        /// Binding path that was looked up.
        target: String,
        /// Bundle that was searched.
        bundle: Utf8PathBuf,
        /// Number of matching declarations.
        count: usize,
    },

    /// An ordinal was negative.
    #[error("ordinal must be a non-negative integer, got {ordinal}")]
    InvalidOrdinal {
        /// The rejected ordinal.
        ordinal: i64,
    },

    /// The rewritten bundle no longer parses.
    #[error("weaving '{target}' would leave {bundle} with syntax errors: {detail}")]
    Reconstitution {
        /// Binding path being rebound.
        target: String,
        /// Bundle being rewritten.
        bundle: Utf8PathBuf,
        /// First syntax errors introduced by the weave.
        detail: String,
    },

    /// A splice offset fell inside a multi-byte character.
    #[error("cannot splice at offset {offset}: not a character boundary")]
    Splice {
        /// The offending byte offset.
        offset: usize,
    },

    /// The source tree has no file at the bundle path.
    #[error("bundle not found in source tree: {path}")]
    BundleNotFound {
        /// Requested bundle path.
        path: Utf8PathBuf,
    },

    /// The bundle path names a binary file.
    #[error("bundle {path} is binary and cannot be woven")]
    BinaryBundle {
        /// Requested bundle path.
        path: Utf8PathBuf,
    },

    /// The invocation info record could not be serialised.
    #[error("failed to serialise invocation info: {0}")]
    InvocationInfo(#[source] serde_json::Error),

    /// Parsing or language detection failed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl WeaveError {
    /// Creates a malformed source error.
    #[must_use]
    pub fn malformed_source(message: impl Into<String>) -> Self {
        Self::MalformedSource {
            message: message.into(),
        }
    }

    /// Creates a content missing error.
    #[must_use]
    pub fn content_missing(target: impl Into<String>) -> Self {
        Self::ContentMissing {
            target: target.into(),
        }
    }

    /// Creates an invalid insertion mode error.
    #[must_use]
    pub fn invalid_insertion_mode(message: impl Into<String>) -> Self {
        Self::InvalidInsertionMode {
            message: message.into(),
        }
    }

    /// Creates a target not found error.
    #[must_use]
    pub fn target_not_found(target: impl Into<String>, bundle: impl Into<Utf8PathBuf>) -> Self {
        Self::TargetNotFound {
            target: target.into(),
            bundle: bundle.into(),
        }
    }
}

/// Step of a load cycle at which a weave failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStep {
    /// Opening the bundle from the source tree.
    Open,
    /// The method weave at this index in the mod's bundle entry.
    Method(usize),
    /// The global weave at this index in the mod's bundle entry.
    Global(usize),
}

impl std::fmt::Display for LoadStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => f.write_str("opening the bundle"),
            Self::Method(index) => write!(f, "method weave #{index}"),
            Self::Global(index) => write!(f, "global weave #{index}"),
        }
    }
}

/// A manifest load cycle stopped at its first failing weave.
#[derive(Debug, Error)]
#[error("mod '{mod_id}' failed at {step} in {bundle}: {source}")]
pub struct LoadCycleError {
    /// Identifier of the mod whose weave failed.
    pub mod_id: String,
    /// Bundle being woven.
    pub bundle: Utf8PathBuf,
    /// Failing step.
    pub step: LoadStep,
    /// Underlying weave failure.
    #[source]
    pub source: Box<WeaveError>,
}
