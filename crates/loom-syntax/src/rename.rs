//! Token-level identifier renaming for function bodies.
//!
//! Weave callbacks name their receiver through a parameter (`ctx`), while the
//! woven code must use the enclosing method's own receiver. Renaming at the
//! token level only touches real identifier references: strings, comments,
//! property names (`obj.ctx`) and longer identifiers (`ctxValue`) are left
//! alone. Shorthand properties (`{ ctx }`) are expanded so the object keeps
//! its key.

use std::ops::Range;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;
use crate::parser::Parser;

/// A body is parsed inside this wrapper so that top-level `return` is legal.
const WRAPPER_OPEN: &str = "function __loom_body__() {";
const WRAPPER_CLOSE: &str = "\n}";

/// Result of a lexical rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The body parsed cleanly and every reference was rewritten.
    Renamed {
        /// Body text after renaming.
        text: String,
        /// Number of references rewritten.
        replacements: usize,
    },
    /// The body does not parse on its own; no rename was attempted.
    Unparsable,
}

/// Renames every identifier reference `from` to `to` inside a function body.
///
/// `body` is the text between a function's braces. It is parsed in a
/// synthetic function wrapper; if the result contains syntax errors the
/// caller gets [`RenameOutcome::Unparsable`] and decides how to fall back.
///
/// # Errors
///
/// Returns an error if the parser for `language` cannot be initialised.
pub fn rename_identifier(
    language: SupportedLanguage,
    body: &str,
    from: &str,
    to: &str,
) -> Result<RenameOutcome, SyntaxError> {
    let wrapped = format!("{WRAPPER_OPEN}{body}{WRAPPER_CLOSE}");
    let parsed = Parser::new(language)?.parse(&wrapped)?;
    if parsed.has_errors() {
        return Ok(RenameOutcome::Unparsable);
    }

    let body_range = WRAPPER_OPEN.len()..WRAPPER_OPEN.len().saturating_add(body.len());
    let mut edits = Vec::new();
    collect_edits(
        parsed.root_node(),
        parsed.source(),
        &body_range,
        (from, to),
        &mut edits,
    );

    let replacements = edits.len();
    let mut text = body.to_owned();
    // Edits are collected in source order; apply back to front so earlier
    // offsets stay valid.
    for (range, replacement) in edits.into_iter().rev() {
        let start = range.start.saturating_sub(body_range.start);
        let end = range.end.saturating_sub(body_range.start);
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) || end > text.len() {
            return Err(SyntaxError::inconsistent(
                "rename range is not on a UTF-8 boundary",
            ));
        }
        text.replace_range(start..end, &replacement);
    }

    Ok(RenameOutcome::Renamed { text, replacements })
}

fn collect_edits(
    node: tree_sitter::Node<'_>,
    source: &str,
    body_range: &Range<usize>,
    (from, to): (&str, &str),
    edits: &mut Vec<(Range<usize>, String)>,
) {
    let range = node.byte_range();
    if range.end <= body_range.start || range.start >= body_range.end {
        return;
    }

    let text = source.get(range.clone()).unwrap_or_default();
    match node.kind() {
        "identifier" if text == from => edits.push((range, to.to_owned())),
        "shorthand_property_identifier" if text == from => {
            edits.push((range, format!("{from}: {to}")));
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_edits(child, source, body_range, (from, to), edits);
            }
        }
    }
}
