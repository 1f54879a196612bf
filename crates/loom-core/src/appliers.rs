//! Weave appliers: one per insertion mode, plus the global applier.
//!
//! Every applier runs the same pipeline against the live bundle text:
//! resolve the target, split it, generate content, splice, reconstitute,
//! rebind. They differ only in where the content is spliced. Appliers are
//! not idempotent; applying the same weave twice weaves it twice.

use tracing::info;

use crate::WEAVE_TARGET;
use crate::bundle::Bundle;
use crate::description::{GlobalWeaveDescription, InsertionMode, ModeTag, WeaveDescription};
use crate::error::WeaveError;
use crate::generator;
use crate::resolver::{find_occurrence_ends, find_own_scope_return_offset, splice_at};
use crate::splitter::SplitFunction;

/// Applies method weaves of a single insertion mode.
pub trait WeaveApplier {
    /// Mode this applier handles.
    fn mode(&self) -> ModeTag;

    /// Splices `content` into `body` at this applier's insertion point.
    ///
    /// # Errors
    ///
    /// Fails if `at` is not this applier's mode or a splice offset is
    /// invalid.
    fn splice(&self, body: &str, content: &str, at: &InsertionMode) -> Result<String, WeaveError>;

    /// Rewrites the weave's target method in `bundle`.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::ModeMismatch`] for a weave of another mode, and
    /// propagates resolution, splitting, generation, and rebinding failures.
    /// On error the bundle is unchanged.
    fn apply(&self, bundle: &mut Bundle, weave: &WeaveDescription) -> Result<(), WeaveError> {
        check_mode(self.mode(), weave.at())?;
        let binding = bundle.resolve(weave.method())?;
        let split = SplitFunction::split(binding.text())?;
        let content = generator::method_content(weave, bundle.language())?;
        let body = self.splice(split.body(), &content, weave.at())?;
        bundle.rebind(&binding, &split.with_body(body).reconstitute())?;
        info!(
            target: WEAVE_TARGET,
            bundle = %bundle.path(),
            method = weave.method(),
            mode = %self.mode(),
            cancellable = weave.is_cancellable(),
            "applied weave"
        );
        Ok(())
    }
}

fn check_mode(expected: ModeTag, at: &InsertionMode) -> Result<(), WeaveError> {
    let found = at.tag();
    if found == expected {
        Ok(())
    } else {
        Err(WeaveError::ModeMismatch { expected, found })
    }
}

/// Inserts content before every original statement.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadApplier;

impl WeaveApplier for HeadApplier {
    fn mode(&self) -> ModeTag {
        ModeTag::Head
    }

    fn splice(&self, body: &str, content: &str, at: &InsertionMode) -> Result<String, WeaveError> {
        check_mode(ModeTag::Head, at)?;
        Ok(format!("{content}{body}"))
    }
}

/// Inserts content before the function's own terminal `return`, or at the
/// end of the body when there is none.
#[derive(Debug, Default, Clone, Copy)]
pub struct TailApplier;

impl WeaveApplier for TailApplier {
    fn mode(&self) -> ModeTag {
        ModeTag::Tail
    }

    fn splice(&self, body: &str, content: &str, at: &InsertionMode) -> Result<String, WeaveError> {
        check_mode(ModeTag::Tail, at)?;
        find_own_scope_return_offset(body).map_or_else(
            || Ok(format!("{body}{content}")),
            |offset| splice_at(body, content, &[offset], None),
        )
    }
}

/// Inserts content after occurrences of a literal token.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertApplier;

impl WeaveApplier for InsertApplier {
    fn mode(&self) -> ModeTag {
        ModeTag::Insert
    }

    fn splice(&self, body: &str, content: &str, at: &InsertionMode) -> Result<String, WeaveError> {
        match at {
            InsertionMode::Insert { target, ordinal } => {
                splice_at(body, content, &find_occurrence_ends(body, target), *ordinal)
            }
            other => Err(WeaveError::ModeMismatch {
                expected: ModeTag::Insert,
                found: other.tag(),
            }),
        }
    }
}

/// Applies weaves to free functions, always by token.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalApplier;

impl GlobalApplier {
    /// Rewrites `function` in `bundle` with the weave's content inserted
    /// after its token.
    ///
    /// # Errors
    ///
    /// Propagates resolution, splitting, generation, and rebinding
    /// failures. On error the bundle is unchanged.
    pub fn apply(
        self,
        bundle: &mut Bundle,
        weave: &GlobalWeaveDescription,
        function: &str,
    ) -> Result<(), WeaveError> {
        let binding = bundle.resolve(function)?;
        let split = SplitFunction::split(binding.text())?;
        let content = generator::global_content(weave, bundle.language())?;
        let offsets = find_occurrence_ends(split.body(), weave.target());
        let body = splice_at(split.body(), &content, &offsets, weave.ordinal())?;
        bundle.rebind(&binding, &split.with_body(body).reconstitute())?;
        info!(
            target: WEAVE_TARGET,
            bundle = %bundle.path(),
            function,
            token = weave.target(),
            occurrences = offsets.len(),
            "applied global weave"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::WeaveContent;
    use rstest::{fixture, rstest};

    fn code(method: &str, at: InsertionMode, text: &str) -> WeaveDescription {
        WeaveDescription::new(method, at, WeaveContent::Code(text.to_owned()))
    }

    fn body_of(bundle: &Bundle, target: &str) -> String {
        let binding = bundle.resolve(target).expect("resolves");
        SplitFunction::split(binding.text())
            .expect("splits")
            .body()
            .to_owned()
    }

    #[fixture]
    fn bundle() -> Bundle {
        Bundle::new(
            "main.js",
            "function run() { a(); b(); return c(); }\n\
             function loop() { x++;x++;x++; }\n\
             function guard(v) { if (v) { return 1; } step(); }\n",
        )
        .expect("bundle")
    }

    #[rstest]
    fn tail_lands_before_the_own_scope_return(mut bundle: Bundle) {
        TailApplier
            .apply(&mut bundle, &code("run", InsertionMode::Tail, "log();"))
            .expect("applies");
        assert_eq!(body_of(&bundle, "run"), " a(); b(); log();return c(); ");
    }

    #[rstest]
    fn tail_appends_when_the_return_is_nested(mut bundle: Bundle) {
        TailApplier
            .apply(&mut bundle, &code("guard", InsertionMode::Tail, "done();"))
            .expect("applies");
        assert_eq!(
            body_of(&bundle, "guard"),
            " if (v) { return 1; } step(); done();"
        );
    }

    #[rstest]
    fn head_precedes_every_statement(mut bundle: Bundle) {
        HeadApplier
            .apply(&mut bundle, &code("run", InsertionMode::Head, "first();"))
            .expect("applies");
        assert_eq!(body_of(&bundle, "run"), "first(); a(); b(); return c(); ");
    }

    #[rstest]
    #[case(1, " x++;x++/*w*/;x++; ")]
    #[case(5, " x++;x++;x++; ")]
    fn insert_honours_the_ordinal(
        mut bundle: Bundle,
        #[case] ordinal: usize,
        #[case] expected: &str,
    ) {
        let at = InsertionMode::insert_at("x++", ordinal).expect("valid");
        InsertApplier
            .apply(&mut bundle, &code("loop", at, "/*w*/"))
            .expect("applies");
        assert_eq!(body_of(&bundle, "loop"), expected);
    }

    #[rstest]
    fn mismatched_modes_are_rejected_without_changes(mut bundle: Bundle) {
        let before = bundle.source().to_owned();
        let error = HeadApplier
            .apply(&mut bundle, &code("run", InsertionMode::Tail, "log();"))
            .expect_err("wrong applier");

        assert!(matches!(
            error,
            WeaveError::ModeMismatch {
                expected: ModeTag::Head,
                found: ModeTag::Tail,
            }
        ));
        assert_eq!(bundle.source(), before);
    }

    #[rstest]
    fn cancellable_head_weave_guards_the_original_body(mut bundle: Bundle) {
        let weave = WeaveDescription::new(
            "run",
            InsertionMode::Head,
            WeaveContent::Callback("(ctx, info) => { info.cancel(); }".to_owned()),
        )
        .with_cancellable(true);
        HeadApplier.apply(&mut bundle, &weave).expect("applies");

        let body = body_of(&bundle, "run");
        let guard = body
            .find("if (info.cancelled) return info.returnValue;")
            .expect("guard present");
        let original = body.find("a();").expect("original statement present");
        assert!(body.contains("info.cancelWithValue = (value) =>"));
        assert!(guard < original);
    }

    #[test]
    fn typed_callbacks_weave_into_typescript_bundles() {
        let mut bundle = Bundle::new(
            "main.ts",
            "class Car {\n  update(dt: number): void { this.x += dt; }\n}\n",
        )
        .expect("typescript bundle");
        let weave = WeaveDescription::new(
            "Car.prototype.update",
            InsertionMode::Head,
            WeaveContent::Callback(
                "(car: Car, info: Info) => { if (car.frozen) info.cancel(); }".to_owned(),
            ),
        )
        .with_cancellable(true);

        HeadApplier.apply(&mut bundle, &weave).expect("applies");

        let body = body_of(&bundle, "Car.prototype.update");
        assert!(body.starts_with("var info = {"));
        assert!(body.contains(" if (this.frozen) info.cancel(); "));
        assert!(body.ends_with(" this.x += dt; "));
    }

    #[rstest]
    fn later_global_weaves_land_closer_to_the_token(mut bundle: Bundle) {
        for text in ["A();", "B();"] {
            let weave =
                GlobalWeaveDescription::new("loop", "x++;", WeaveContent::Code(text.to_owned()))
                    .expect("valid")
                    .with_ordinal(0);
            GlobalApplier
                .apply(&mut bundle, &weave, "loop")
                .expect("applies");
        }
        assert_eq!(body_of(&bundle, "loop"), " x++;B();A();x++;x++; ");
    }

    #[rstest]
    fn missing_targets_fail_without_changes(mut bundle: Bundle) {
        let before = bundle.source().to_owned();
        let error = TailApplier
            .apply(&mut bundle, &code("Car.prototype.update", InsertionMode::Tail, "x();"))
            .expect_err("missing");
        assert!(matches!(error, WeaveError::TargetNotFound { .. }));
        assert_eq!(bundle.source(), before);
    }
}
