//! Insertion-point resolution over body text.
//!
//! Tokens are literal substrings; nothing here interprets them as patterns.

use tracing::debug;

use crate::WEAVE_TARGET;
use crate::error::WeaveError;

/// End offsets of every non-overlapping occurrence of `token`, left to right.
///
/// An empty token has no occurrences.
#[must_use]
pub fn find_occurrence_ends(body: &str, token: &str) -> Vec<usize> {
    if token.is_empty() {
        return Vec::new();
    }
    body.match_indices(token)
        .map(|(start, matched)| start.saturating_add(matched.len()))
        .collect()
}

/// Inserts `content` at the selected offsets of `body`.
///
/// With `ordinal`, only `offsets[ordinal]` is used and a missing entry
/// leaves the body unchanged. Without it, content is inserted at every
/// offset. Offsets past the end of `body` are skipped.
///
/// # Errors
///
/// Returns [`WeaveError::Splice`] if an offset is not a character boundary.
pub fn splice_at(
    body: &str,
    content: &str,
    offsets: &[usize],
    ordinal: Option<usize>,
) -> Result<String, WeaveError> {
    let selected: &[usize] = match ordinal {
        Some(index) => match offsets.get(index) {
            Some(offset) => std::slice::from_ref(offset),
            None => {
                debug!(
                    target: WEAVE_TARGET,
                    ordinal = index,
                    occurrences = offsets.len(),
                    "ordinal beyond occurrences; body unchanged"
                );
                &[]
            }
        },
        None => offsets,
    };

    let mut out = String::with_capacity(
        body.len()
            .saturating_add(content.len().saturating_mul(selected.len())),
    );
    let mut cursor = 0_usize;
    for &offset in selected {
        if offset > body.len() || offset < cursor {
            continue;
        }
        let chunk = body
            .get(cursor..offset)
            .ok_or(WeaveError::Splice { offset })?;
        out.push_str(chunk);
        out.push_str(content);
        cursor = offset;
    }
    out.push_str(body.get(cursor..).unwrap_or_default());
    Ok(out)
}

/// Offset of the last `return` when it belongs to the function's own scope.
///
/// Any `}` after the last `return` means it sits in a nested block, and
/// the result is `None`. Braces inside strings or comments also count.
#[must_use]
pub fn find_own_scope_return_offset(body: &str) -> Option<usize> {
    let offset = body.rfind("return")?;
    let after = body.get(offset..).unwrap_or_default();
    (!after.contains('}')).then_some(offset)
}
