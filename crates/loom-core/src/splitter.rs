//! Signature splitting of function source text.
//!
//! The split is deliberately naive: parameters come from the first
//! parenthesised group and the body from the first `{` to the last `}`.
//! Default values containing parentheses or braces are not supported.

use crate::error::WeaveError;

/// A function declaration split into the parts weaving rewrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFunction {
    head: String,
    params: Vec<String>,
    infix: String,
    body: String,
    trailer: String,
}

impl SplitFunction {
    /// Splits `source` into head, parameters, infix, body, and trailer.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::MalformedSource`] if a delimiter is missing or
    /// the body opens before the parameter list closes.
    pub fn split(source: &str) -> Result<Self, WeaveError> {
        let open_paren = find(source, '(')?;
        let close_paren = find(source, ')')?;
        let open_brace = find(source, '{')?;
        let close_brace = source
            .rfind('}')
            .ok_or_else(|| WeaveError::malformed_source("no '}' in function text"))?;

        if close_paren < open_paren {
            return Err(WeaveError::malformed_source(
                "')' appears before the first '('",
            ));
        }
        if open_brace < close_paren {
            return Err(WeaveError::malformed_source(
                "body opens before the parameter list closes",
            ));
        }

        let slice = |from: usize, to: usize| source.get(from..to).unwrap_or_default().to_owned();
        let params = slice(open_paren.saturating_add(1), close_paren)
            .split(',')
            .map(|param| param.trim().to_owned())
            .collect();

        Ok(Self {
            head: slice(0, open_paren),
            params,
            infix: slice(close_paren.saturating_add(1), open_brace),
            body: slice(open_brace.saturating_add(1), close_brace),
            trailer: slice(close_brace.saturating_add(1), source.len()),
        })
    }

    /// Trimmed parameter slots, annotations and defaults included. An empty
    /// list yields a single empty entry.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Name bound by the parameter at `index`, or `None` if absent or empty.
    ///
    /// The name ends at the first `:`, `?` or `=`, so `car: Car`,
    /// `info?: Info` and `ctx = fallback` yield `car`, `info` and `ctx`.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params
            .get(index)
            .map(String::as_str)
            .map(param_name)
            .filter(|name| !name.is_empty())
    }

    /// Text strictly between the outer braces.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns a copy with the body replaced.
    #[must_use]
    pub fn with_body(&self, body: String) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    /// Rebuilds declaration text from the parts.
    #[must_use]
    pub fn reconstitute(&self) -> String {
        format!(
            "{}({}){}{{{}}}{}",
            self.head,
            self.params.join(","),
            self.infix,
            self.body,
            self.trailer
        )
    }
}

fn param_name(slot: &str) -> &str {
    slot.split([':', '?', '=']).next().unwrap_or_default().trim()
}

fn find(source: &str, delimiter: char) -> Result<usize, WeaveError> {
    source
        .find(delimiter)
        .ok_or_else(|| WeaveError::malformed_source(format!("no '{delimiter}' in function text")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("function (a, b) { return a + b; }", &["a", "b"], " return a + b; ")]
    #[case("update(dt) {}", &["dt"], "")]
    #[case("() => { go(); }", &[""], " go(); ")]
    #[case("function (x) { if (x) { y(); } }", &["x"], " if (x) { y(); } ")]
    fn splits_params_and_body(
        #[case] source: &str,
        #[case] params: &[&str],
        #[case] body: &str,
    ) {
        let split = SplitFunction::split(source).expect("well formed");
        assert_eq!(split.params(), params);
        assert_eq!(split.body(), body);
    }

    #[rstest]
    #[case("function f { }")]
    #[case("function f( { }")]
    #[case("function f() ")]
    #[case("x => { y(); }")]
    #[case("function f(a = {}) { }")]
    fn rejects_malformed_sources(#[case] source: &str) {
        let error = SplitFunction::split(source).expect_err("malformed");
        assert!(matches!(error, WeaveError::MalformedSource { .. }));
    }

    #[rstest]
    #[case("function boot() { start(); }", "function boot() { start(); }")]
    #[case("static create(a, b) { }", "static create(a,b) { }")]
    #[case("(dt: number): void => { x(); }", "(dt: number): void => { x(); }")]
    fn reconstitution_keeps_declaration_shape(#[case] source: &str, #[case] expected: &str) {
        let split = SplitFunction::split(source).expect("well formed");
        assert_eq!(split.reconstitute(), expected);
    }

    #[test]
    fn empty_parameter_slots_count_as_absent() {
        let split = SplitFunction::split("function (, info) {}").expect("well formed");
        assert_eq!(split.param(0), None);
        assert_eq!(split.param(1), Some("info"));
        assert_eq!(split.param(2), None);
    }

    #[rstest]
    #[case("(car: Car, info: Info) => { car.x = 1; }", Some("car"), Some("info"))]
    #[case("(ctx = fallback) => { ctx.go(); }", Some("ctx"), None)]
    #[case("function (car?: Car, info = null) { }", Some("car"), Some("info"))]
    #[case("(car:Car,info :Info) => { }", Some("car"), Some("info"))]
    fn parameter_names_drop_annotations_and_defaults(
        #[case] source: &str,
        #[case] first: Option<&str>,
        #[case] second: Option<&str>,
    ) {
        let split = SplitFunction::split(source).expect("well formed");
        assert_eq!(split.param(0), first);
        assert_eq!(split.param(1), second);
    }

    #[test]
    fn replacing_the_body_keeps_the_signature() {
        let split = SplitFunction::split("tick(dt) { a(); }").expect("well formed");
        assert_eq!(
            split.with_body(" b(); a(); ".to_owned()).reconstitute(),
            "tick(dt) { b(); a(); }"
        );
    }
}
