//! Weave descriptions: what to insert, where, and into which function.
//!
//! Descriptions are immutable once built. Manifests deserialise through raw
//! mirror types so that malformed input surfaces as a [`WeaveError`] with
//! the same taxonomy as programmatic construction.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::WEAVE_TARGET;
use crate::error::WeaveError;

/// Mode tag of a weave, used for dispatch and mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTag {
    /// Start of the body.
    Head,
    /// Before the function's own terminal `return`, or end of body.
    Tail,
    /// After occurrences of a literal token.
    Insert,
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Head => "HEAD",
            Self::Tail => "TAIL",
            Self::Insert => "INSERT",
        })
    }
}

/// Where woven content lands in the target body.
///
/// Serialised as `"HEAD"`, `"TAIL"`, or
/// `{ "name": "INSERT", "target": "...", "ordinal": 0 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInsertionMode", into = "RawInsertionMode")]
pub enum InsertionMode {
    /// Before all original statements.
    Head,
    /// Before the own-scope `return`, else appended.
    Tail,
    /// After the `ordinal`-th occurrence of `target`, or after every
    /// occurrence when `ordinal` is `None`.
    Insert {
        /// Literal token to insert after.
        target: String,
        /// Zero-based occurrence to select.
        ordinal: Option<usize>,
    },
}

impl InsertionMode {
    /// Insert after every occurrence of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidInsertionMode`] if `target` is empty.
    pub fn insert(target: impl Into<String>) -> Result<Self, WeaveError> {
        Self::insert_with(target.into(), None)
    }

    /// Insert after the `ordinal`-th (zero-based) occurrence of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidInsertionMode`] if `target` is empty.
    pub fn insert_at(target: impl Into<String>, ordinal: usize) -> Result<Self, WeaveError> {
        Self::insert_with(target.into(), Some(ordinal))
    }

    fn insert_with(target: String, ordinal: Option<usize>) -> Result<Self, WeaveError> {
        if target.is_empty() {
            return Err(WeaveError::invalid_insertion_mode(
                "INSERT requires a non-empty target token",
            ));
        }
        Ok(Self::Insert { target, ordinal })
    }

    /// Returns the dispatch tag for this mode.
    #[must_use]
    pub const fn tag(&self) -> ModeTag {
        match self {
            Self::Head => ModeTag::Head,
            Self::Tail => ModeTag::Tail,
            Self::Insert { .. } => ModeTag::Insert,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawInsertionMode {
    Tag(String),
    Record {
        name: String,
        #[serde(default)]
        target: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ordinal: Option<i64>,
        /// Keys an INSERT record does not define; any entry is an error.
        #[serde(flatten)]
        unknown: serde_json::Map<String, serde_json::Value>,
    },
    Other(serde_json::Value),
}

impl TryFrom<RawInsertionMode> for InsertionMode {
    type Error = WeaveError;

    fn try_from(raw: RawInsertionMode) -> Result<Self, Self::Error> {
        match raw {
            RawInsertionMode::Tag(tag) => match tag.as_str() {
                "HEAD" => Ok(Self::Head),
                "TAIL" => Ok(Self::Tail),
                other => Err(WeaveError::invalid_insertion_mode(format!(
                    "unknown mode tag '{other}'"
                ))),
            },
            RawInsertionMode::Record {
                name,
                target,
                ordinal,
                unknown,
            } => {
                if name != "INSERT" {
                    return Err(WeaveError::invalid_insertion_mode(format!(
                        "unknown mode record '{name}'"
                    )));
                }
                if let Some(key) = unknown.keys().next() {
                    return Err(WeaveError::invalid_insertion_mode(format!(
                        "unknown field '{key}' in INSERT record"
                    )));
                }
                let token = target.unwrap_or_default();
                Self::insert_with(token, ordinal.map(checked_ordinal).transpose()?)
            }
            RawInsertionMode::Other(value) => Err(WeaveError::invalid_insertion_mode(format!(
                "expected \"HEAD\", \"TAIL\" or an INSERT record, got {value}"
            ))),
        }
    }
}

impl From<InsertionMode> for RawInsertionMode {
    fn from(mode: InsertionMode) -> Self {
        match mode {
            InsertionMode::Head => Self::Tag("HEAD".to_owned()),
            InsertionMode::Tail => Self::Tag("TAIL".to_owned()),
            InsertionMode::Insert { target, ordinal } => Self::Record {
                name: "INSERT".to_owned(),
                target: Some(target),
                ordinal: ordinal.and_then(|n| i64::try_from(n).ok()),
                unknown: serde_json::Map::new(),
            },
        }
    }
}

/// Converts a manifest ordinal, rejecting negatives.
fn checked_ordinal(ordinal: i64) -> Result<usize, WeaveError> {
    usize::try_from(ordinal).map_err(|_| WeaveError::InvalidOrdinal { ordinal })
}

/// Source of the text woven into the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeaveContent {
    /// Literal code spliced verbatim; no info record, receiver rename, or
    /// cancellation scaffolding is generated.
    Code(String),
    /// Source text of a function `(receiver, info, ...locals) => { ... }`
    /// whose body is woven in.
    Callback(String),
}

impl WeaveContent {
    fn from_sources(
        target: &str,
        code: Option<String>,
        callback: Option<String>,
    ) -> Result<Self, WeaveError> {
        match (code, callback) {
            (Some(code), Some(_)) => {
                warn!(
                    target: WEAVE_TARGET,
                    weave = target,
                    "weave supplies both code and callback; using code"
                );
                Ok(Self::Code(code))
            }
            (Some(code), None) => Ok(Self::Code(code)),
            (None, Some(callback)) => Ok(Self::Callback(callback)),
            (None, None) => Err(WeaveError::content_missing(target)),
        }
    }
}

/// One intended edit to a method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawWeaveDescription")]
pub struct WeaveDescription {
    method: String,
    at: InsertionMode,
    cancellable: bool,
    content: WeaveContent,
}

impl WeaveDescription {
    /// Creates a non-cancellable weave of `content` into `method`.
    #[must_use]
    pub fn new(method: impl Into<String>, at: InsertionMode, content: WeaveContent) -> Self {
        Self {
            method: method.into(),
            at,
            cancellable: false,
            content,
        }
    }

    /// Marks the weave as cancellable.
    #[must_use]
    pub const fn with_cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    /// Binding path of the method to modify.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Insertion mode.
    #[must_use]
    pub const fn at(&self) -> &InsertionMode {
        &self.at
    }

    /// Whether woven code may cancel the original method.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Content to weave.
    #[must_use]
    pub const fn content(&self) -> &WeaveContent {
        &self.content
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWeaveDescription {
    method: String,
    at: InsertionMode,
    #[serde(default)]
    cancellable: bool,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    callback: Option<String>,
}

impl TryFrom<RawWeaveDescription> for WeaveDescription {
    type Error = WeaveError;

    fn try_from(raw: RawWeaveDescription) -> Result<Self, Self::Error> {
        let content = WeaveContent::from_sources(&raw.method, raw.code, raw.callback)?;
        Ok(Self::new(raw.method, raw.at, content).with_cancellable(raw.cancellable))
    }
}

/// One intended edit to a free-standing function, always by token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawGlobalWeaveDescription")]
pub struct GlobalWeaveDescription {
    function: String,
    target: String,
    ordinal: Option<usize>,
    content: WeaveContent,
}

impl GlobalWeaveDescription {
    /// Creates a weave inserting `content` after every occurrence of
    /// `target` in `function`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvalidInsertionMode`] if `target` is empty.
    pub fn new(
        function: impl Into<String>,
        target: impl Into<String>,
        content: WeaveContent,
    ) -> Result<Self, WeaveError> {
        let token = target.into();
        if token.is_empty() {
            return Err(WeaveError::invalid_insertion_mode(
                "global weave requires a non-empty target token",
            ));
        }
        Ok(Self {
            function: function.into(),
            target: token,
            ordinal: None,
            content,
        })
    }

    /// Restricts insertion to the `ordinal`-th (zero-based) occurrence.
    #[must_use]
    pub const fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = Some(ordinal);
        self
    }

    /// Binding path of the free function this weave is declared for.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Literal token to insert after.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Selected occurrence, if any.
    #[must_use]
    pub const fn ordinal(&self) -> Option<usize> {
        self.ordinal
    }

    /// Content to weave.
    #[must_use]
    pub const fn content(&self) -> &WeaveContent {
        &self.content
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGlobalWeaveDescription {
    function: String,
    target: String,
    #[serde(default)]
    ordinal: Option<i64>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    callback: Option<String>,
}

impl TryFrom<RawGlobalWeaveDescription> for GlobalWeaveDescription {
    type Error = WeaveError;

    fn try_from(raw: RawGlobalWeaveDescription) -> Result<Self, Self::Error> {
        let content = WeaveContent::from_sources(&raw.function, raw.code, raw.callback)?;
        let weave = Self::new(raw.function, raw.target, content)?;
        match raw.ordinal.map(checked_ordinal).transpose()? {
            Some(ordinal) => Ok(weave.with_ordinal(ordinal)),
            None => Ok(weave),
        }
    }
}

/// Per-call record materialised into woven method code.
///
/// Serialised as a JSON object literal; `cancel` and `cancelWithValue` are
/// attached by the generated code when the weave is cancellable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationInfo {
    name: String,
    cancellable: bool,
    cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_value: Option<serde_json::Value>,
}

impl InvocationInfo {
    /// Creates an uncancelled record for the method `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, cancellable: bool) -> Self {
        Self {
            name: name.into(),
            cancellable,
            cancelled: false,
            return_value: None,
        }
    }

    /// Name of the woven method.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the woven code may cancel the call.
    #[must_use]
    pub const fn cancellable(&self) -> bool {
        self.cancellable
    }

    /// Renders the record as a source literal.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::InvocationInfo`] if serialisation fails.
    pub fn to_literal(&self) -> Result<String, WeaveError> {
        serde_json::to_string(self).map_err(WeaveError::InvocationInfo)
    }
}
