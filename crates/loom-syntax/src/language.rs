//! Script languages a bundle can be written in.
//!
//! A bundle's language comes from its file extension. Both languages parse
//! with the TSX grammar, which accepts plain JavaScript, JSX, and type
//! annotations alike.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Extensions recognised for each language, lower case.
const EXTENSIONS: &[(&str, SupportedLanguage)] = &[
    ("js", SupportedLanguage::JavaScript),
    ("mjs", SupportedLanguage::JavaScript),
    ("cjs", SupportedLanguage::JavaScript),
    ("jsx", SupportedLanguage::JavaScript),
    ("ts", SupportedLanguage::TypeScript),
    ("mts", SupportedLanguage::TypeScript),
    ("cts", SupportedLanguage::TypeScript),
    ("tsx", SupportedLanguage::TypeScript),
];

/// Language of a script bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedLanguage {
    /// Compiled JavaScript, the usual bundle output.
    #[default]
    JavaScript,
    /// TypeScript sources shipped unbundled.
    TypeScript,
}

impl SupportedLanguage {
    /// Looks up a file extension, ignoring case.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        EXTENSIONS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(ext))
            .map(|&(_, language)| language)
    }

    /// Language of the file at `path`, judged by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }

    /// Grammar used to parse this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::JavaScript | Self::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
        }
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A language name that matches neither JavaScript nor TypeScript.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("'{0}' is not a bundle language; use javascript or typescript")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// The rejected name, trimmed and lower-cased.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for SupportedLanguage {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let name = input.trim().to_ascii_lowercase();
        match name.as_str() {
            "javascript" | "js" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            _ => Err(LanguageParseError(name)),
        }
    }
}
