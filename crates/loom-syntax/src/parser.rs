//! Parsing bundle text into Tree-sitter trees.
//!
//! Tree-sitter always produces a tree; broken input shows up as ERROR and
//! MISSING nodes rather than a failed parse. [`ParseResult`] owns the text
//! next to its tree so node text can be sliced without a second buffer, and
//! [`Diagnostic`] turns the broken nodes into printable locations.

use std::fmt;

use crate::error::SyntaxError;
use crate::language::SupportedLanguage;

/// Longest snippet quoted in a diagnostic, in characters.
const SNIPPET_CHARS: usize = 40;

/// A Tree-sitter parser bound to one bundle language.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl Parser {
    /// Loads the grammar for `language`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::GrammarUnavailable`] when Tree-sitter rejects
    /// the grammar, which happens on an ABI mismatch.
    pub fn new(language: SupportedLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|err| SyntaxError::grammar_unavailable(language, err.to_string()))?;
        Ok(Self { inner, language })
    }

    /// Parses `source` from scratch.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::NoTree`] if Tree-sitter gives up without a
    /// tree.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        let language = self.language;
        let tree = self
            .inner
            .parse(source, None)
            .ok_or(SyntaxError::NoTree { language })?;
        Ok(ParseResult {
            tree,
            source: source.to_owned(),
            language,
        })
    }
}

/// A syntax tree together with the text it was parsed from.
#[derive(Debug)]
pub struct ParseResult {
    tree: tree_sitter::Tree,
    source: String,
    language: SupportedLanguage,
}

impl ParseResult {
    /// Parsed text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Language the text was parsed as.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Root node of the tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    /// Text covered by `node`; empty if the node's range does not fit.
    #[must_use]
    pub fn text_of(&self, node: tree_sitter::Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or_default()
    }

    /// `true` if any ERROR or MISSING node is present.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// Every ERROR and MISSING node, in document order.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut found = Vec::new();
        let mut pending = vec![self.root_node()];
        while let Some(node) = pending.pop() {
            if node.is_error() || node.is_missing() {
                found.push(Diagnostic::at(node, &self.source));
            }
            if node.has_error() {
                let mut cursor = node.walk();
                let children: Vec<_> = node.children(&mut cursor).collect();
                pending.extend(children.into_iter().rev());
            }
        }
        found
    }
}

/// Location and description of one broken node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// One-based line.
    pub line: u32,
    /// One-based column, in bytes.
    pub column: u32,
    /// Node kind Tree-sitter expected but did not find, for MISSING nodes.
    pub missing: Option<String>,
    /// Start of the offending text, shortened to a few dozen characters.
    pub snippet: String,
}

impl Diagnostic {
    fn at(node: tree_sitter::Node<'_>, source: &str) -> Self {
        let start = node.start_position();
        let text = source.get(node.byte_range()).unwrap_or_default();
        let mut snippet: String = text.chars().take(SNIPPET_CHARS).collect();
        if text.chars().nth(SNIPPET_CHARS).is_some() {
            snippet.push_str("...");
        }
        Self {
            line: one_based(start.row),
            column: one_based(start.column),
            missing: node.is_missing().then(|| node.kind().to_owned()),
            snippet,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.missing {
            Some(kind) => write!(f, "{}:{}: missing `{kind}`", self.line, self.column),
            None => write!(
                f,
                "{}:{}: unexpected `{}`",
                self.line, self.column, self.snippet
            ),
        }
    }
}

fn one_based(zero_based: usize) -> u32 {
    u32::try_from(zero_based.saturating_add(1)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(language: SupportedLanguage, source: &str) -> ParseResult {
        Parser::new(language)
            .expect("grammar loads")
            .parse(source)
            .expect("tree")
    }

    #[rstest]
    #[case(SupportedLanguage::JavaScript, "Game.prototype.tick = function (dt) { step(dt); };")]
    #[case(SupportedLanguage::JavaScript, "class Car { update(dt) { this.x += dt; } }")]
    #[case(SupportedLanguage::TypeScript, "function speed(car: Car): number { return car.v; }")]
    fn clean_bundles_have_no_diagnostics(
        #[case] language: SupportedLanguage,
        #[case] source: &str,
    ) {
        let parsed = parse(language, source);
        assert!(!parsed.has_errors());
        assert!(parsed.diagnostics().is_empty());
        assert_eq!(parsed.language(), language);
    }

    #[rstest]
    #[case("function broken( {")]
    #[case("class Car { update() { }")]
    #[case("var info = ;")]
    fn broken_bundles_report_diagnostics(#[case] source: &str) {
        let parsed = parse(SupportedLanguage::JavaScript, source);
        assert!(parsed.has_errors());
        assert!(!parsed.diagnostics().is_empty());
    }

    #[test]
    fn diagnostics_carry_one_based_positions() {
        let parsed = parse(SupportedLanguage::JavaScript, "function f() {\n  let x = ;\n}");
        let first = parsed.diagnostics().into_iter().next().expect("one diagnostic");
        assert_eq!(first.line, 2);
        assert!(first.column >= 1);
    }

    #[test]
    fn long_snippets_are_shortened() {
        let source = format!("function f() {{ {} }}", "a ".repeat(60));
        let parsed = parse(SupportedLanguage::JavaScript, &source);
        for diagnostic in parsed.diagnostics() {
            assert!(diagnostic.snippet.chars().count() <= SNIPPET_CHARS + 3);
        }
    }

    #[test]
    fn text_of_slices_node_source() {
        let parsed = parse(SupportedLanguage::JavaScript, "tick();");
        assert_eq!(parsed.text_of(parsed.root_node()), "tick();");
    }
}
