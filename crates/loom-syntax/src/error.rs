//! Failures raised while reading bundle syntax.

use std::path::PathBuf;

use thiserror::Error;

use crate::language::SupportedLanguage;

/// Errors from parsing, locating, or renaming inside a bundle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// The grammar for a language could not be loaded into the parser.
    #[error("cannot load the {language} grammar: {message}")]
    GrammarUnavailable {
        /// Language whose grammar was rejected.
        language: SupportedLanguage,
        /// Reason reported by Tree-sitter.
        message: String,
    },

    /// A bundle path has no recognised script extension.
    #[error("no script language for {}", path.display())]
    UnknownLanguage {
        /// Offending bundle path.
        path: PathBuf,
    },

    /// Tree-sitter returned no tree.
    #[error("{language} parser produced no syntax tree")]
    NoTree {
        /// Language being parsed.
        language: SupportedLanguage,
    },

    /// A byte range or offset did not line up with the text it indexes.
    #[error("inconsistent syntax state: {message}")]
    Inconsistent {
        /// What did not line up.
        message: String,
    },
}

impl SyntaxError {
    /// Grammar load failure for `language`.
    #[must_use]
    pub fn grammar_unavailable(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::GrammarUnavailable {
            language,
            message: message.into(),
        }
    }

    /// No language for the bundle at `path`.
    #[must_use]
    pub const fn unknown_language(path: PathBuf) -> Self {
        Self::UnknownLanguage { path }
    }

    /// Range or offset mismatch between a tree and its text.
    #[must_use]
    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }
}
