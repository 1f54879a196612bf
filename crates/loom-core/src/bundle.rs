//! A bundle is one script file of the patched tree and its binding table.
//!
//! Binding paths are weak references: they are resolved against the current
//! text every time a weave is applied, so a later weave sees the declaration
//! already rewritten by earlier ones.

use std::ops::Range;

use camino::{Utf8Path, Utf8PathBuf};
use loom_syntax::{BindingPath, FunctionLocator, FunctionSite, Parser, SupportedLanguage, SyntaxError};
use tracing::debug;

use crate::WEAVE_TARGET;
use crate::error::WeaveError;

/// Maximum number of syntax errors quoted in a reconstitution failure.
const REPORTED_ERRORS: usize = 3;

/// A script bundle open for weaving.
#[derive(Debug, Clone)]
pub struct Bundle {
    path: Utf8PathBuf,
    language: SupportedLanguage,
    source: String,
    verify_syntax: bool,
}

/// A binding path resolved to one declaration in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    target: String,
    range: Range<usize>,
    text: String,
}

impl Binding {
    /// Binding path as requested.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Byte range of the declaration in the bundle.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Current declaration text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Bundle {
    /// Opens `source` as the bundle at `path`.
    ///
    /// The language is chosen by extension. Syntax verification is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::Syntax`] if the extension names no supported
    /// language.
    pub fn new(path: impl Into<Utf8PathBuf>, source: impl Into<String>) -> Result<Self, WeaveError> {
        let bundle_path = path.into();
        let language = SupportedLanguage::from_path(bundle_path.as_std_path())
            .ok_or_else(|| SyntaxError::unknown_language(bundle_path.clone().into_std_path_buf()))?;
        Ok(Self {
            path: bundle_path,
            language,
            source: source.into(),
            verify_syntax: true,
        })
    }

    /// Enables or disables re-parsing the bundle after each rebind.
    #[must_use]
    pub const fn with_syntax_verification(mut self, verify: bool) -> Self {
        self.verify_syntax = verify;
        self
    }

    /// Relative path of the bundle in its tree.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Language the bundle is parsed as.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Current bundle text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Consumes the bundle and returns its text.
    #[must_use]
    pub fn into_source(self) -> String {
        self.source
    }

    /// Every weavable binding path in source order.
    ///
    /// # Errors
    ///
    /// Fails if the parser cannot be initialised.
    pub fn targets(&self) -> Result<Vec<BindingPath>, WeaveError> {
        Ok(self.sites()?.into_iter().map(|site| site.path().clone()).collect())
    }

    /// Resolves `target` to exactly one declaration.
    ///
    /// `Car.prototype.update` names only the instance method and `Car.update`
    /// prefers the static member; the bare spelling also reaches a lone
    /// instance method. Accessors are named `get Car.prototype.speed` or
    /// `set Car.prototype.speed`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::TargetNotFound`] or
    /// [`WeaveError::AmbiguousTarget`] unless exactly one declaration binds
    /// `target`.
    pub fn resolve(&self, target: &str) -> Result<Binding, WeaveError> {
        let path: BindingPath = target.parse().unwrap_or_default();
        let parsed = Parser::new(self.language)?.parse(&self.source)?;
        let mut matches = FunctionLocator::new().find(&parsed, &path);

        let site = match (matches.pop(), matches.len()) {
            (None, _) => return Err(WeaveError::target_not_found(target, self.path.clone())),
            (Some(site), 0) => site,
            (Some(_), rest) => {
                return Err(WeaveError::AmbiguousTarget {
                    target: target.to_owned(),
                    bundle: self.path.clone(),
                    count: rest.saturating_add(1),
                });
            }
        };

        let range = site.byte_range();
        let text = self
            .source
            .get(range.clone())
            .ok_or_else(|| SyntaxError::inconsistent("function range outside bundle text"))?
            .to_owned();
        debug!(
            target: WEAVE_TARGET,
            bundle = %self.path,
            function = target,
            line = site.line(),
            "resolved weave target"
        );
        Ok(Binding {
            target: target.to_owned(),
            range,
            text,
        })
    }

    /// Replaces the declaration behind `binding` with `replacement`.
    ///
    /// With syntax verification enabled the bundle is left untouched if the
    /// rewrite introduces syntax errors.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::Reconstitution`] when verification fails.
    pub fn rebind(&mut self, binding: &Binding, replacement: &str) -> Result<(), WeaveError> {
        let range = binding.range();
        let (Some(prefix), Some(suffix)) = (
            self.source.get(..range.start),
            self.source.get(range.end..),
        ) else {
            return Err(SyntaxError::inconsistent("binding range outside bundle text").into());
        };
        let rewritten = format!("{prefix}{replacement}{suffix}");

        if self.verify_syntax {
            self.verify(binding, &rewritten)?;
        }
        self.source = rewritten;
        Ok(())
    }

    fn verify(&self, binding: &Binding, rewritten: &str) -> Result<(), WeaveError> {
        let mut parser = Parser::new(self.language)?;
        let before = parser.parse(&self.source)?.diagnostics().len();
        let after = parser.parse(rewritten)?.diagnostics();
        if after.len() <= before {
            return Ok(());
        }

        let detail = after
            .iter()
            .take(REPORTED_ERRORS)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(WeaveError::Reconstitution {
            target: binding.target().to_owned(),
            bundle: self.path.clone(),
            detail,
        })
    }

    fn sites(&self) -> Result<Vec<FunctionSite>, WeaveError> {
        let parsed = Parser::new(self.language)?.parse(&self.source)?;
        Ok(FunctionLocator::new().sites(&parsed))
    }
}
