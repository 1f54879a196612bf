//! Generation of the source text spliced into target bodies.

use loom_syntax::{RenameOutcome, SupportedLanguage, SyntaxError, rename_identifier};
use regex::Regex;
use tracing::{debug, warn};

use crate::WEAVE_TARGET;
use crate::description::{GlobalWeaveDescription, InvocationInfo, WeaveContent, WeaveDescription};
use crate::error::WeaveError;
use crate::splitter::SplitFunction;

const DEFAULT_RECEIVER: &str = "ctx";
const DEFAULT_INFO_PARAM: &str = "info";
const RECEIVER: &str = "this";

/// Text to splice for a method weave.
///
/// Literal code is returned verbatim. A callback is split; its first and
/// second parameters name the receiver and the info record.
///
/// # Errors
///
/// Fails if the callback is malformed or the info record cannot be
/// serialised.
pub fn method_content(
    weave: &WeaveDescription,
    language: SupportedLanguage,
) -> Result<String, WeaveError> {
    match weave.content() {
        WeaveContent::Code(code) => Ok(code.clone()),
        WeaveContent::Callback(callback) => {
            let split = SplitFunction::split(callback)?;
            let info = InvocationInfo::new(weave.method(), weave.is_cancellable());
            method_weave_text(
                split.body(),
                split.param(0).unwrap_or(DEFAULT_RECEIVER),
                split.param(1).unwrap_or(DEFAULT_INFO_PARAM),
                &info,
                language,
            )
        }
    }
}

/// Text to splice for a global weave: the callback body with its receiver
/// renamed, or literal code verbatim.
///
/// # Errors
///
/// Fails if the callback is malformed.
pub fn global_content(
    weave: &GlobalWeaveDescription,
    language: SupportedLanguage,
) -> Result<String, WeaveError> {
    match weave.content() {
        WeaveContent::Code(code) => Ok(code.clone()),
        WeaveContent::Callback(callback) => {
            let split = SplitFunction::split(callback)?;
            global_weave_text(
                split.body(),
                split.param(0).unwrap_or(DEFAULT_RECEIVER),
                language,
            )
        }
    }
}

/// Builds the woven text for a method callback body.
///
/// The info record is declared first, followed by the cancellation closures
/// and trailing early return when the weave is cancellable.
///
/// # Errors
///
/// Fails if the info record cannot be serialised.
pub fn method_weave_text(
    callback_body: &str,
    receiver: &str,
    info_param: &str,
    info: &InvocationInfo,
    language: SupportedLanguage,
) -> Result<String, WeaveError> {
    let mut text = format!("var {info_param} = {};", info.to_literal()?);
    if info.cancellable() {
        text.push_str(&format!(
            "{info_param}.cancel = () => {{ {info_param}.cancelled = true; }};"
        ));
        text.push_str(&format!(
            "{info_param}.cancelWithValue = (value) => {{ {info_param}.cancelled = true; \
             {info_param}.returnValue = value; }};"
        ));
    }
    text.push_str(&rename_receiver(callback_body, receiver, language)?);
    if info.cancellable() {
        text.push_str(&format!(
            "if ({info_param}.cancelled) return {info_param}.returnValue;"
        ));
    }
    Ok(text)
}

/// Builds the woven text for a global callback body.
///
/// # Errors
///
/// Fails only if the rename parser cannot be initialised.
pub fn global_weave_text(
    callback_body: &str,
    receiver: &str,
    language: SupportedLanguage,
) -> Result<String, WeaveError> {
    rename_receiver(callback_body, receiver, language)
}

fn rename_receiver(
    body: &str,
    receiver: &str,
    language: SupportedLanguage,
) -> Result<String, WeaveError> {
    if receiver == RECEIVER {
        return Ok(body.to_owned());
    }
    match rename_identifier(language, body, receiver, RECEIVER)? {
        RenameOutcome::Renamed { text, replacements } => {
            debug!(target: WEAVE_TARGET, receiver, replacements, "renamed receiver");
            Ok(text)
        }
        RenameOutcome::Unparsable => {
            warn!(
                target: WEAVE_TARGET,
                receiver,
                "callback body does not parse; renaming receiver by whole word"
            );
            whole_word_rename(body, receiver)
        }
    }
}

fn whole_word_rename(body: &str, receiver: &str) -> Result<String, WeaveError> {
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(receiver)))
        .map_err(|err| SyntaxError::inconsistent(format!("receiver pattern: {err}")))?;
    Ok(pattern.replace_all(body, RECEIVER).into_owned())
}
