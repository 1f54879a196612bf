//! Registration entry points and the per-bundle weave session.

use crate::appliers::{GlobalApplier, HeadApplier, InsertApplier, TailApplier, WeaveApplier};
use crate::bundle::Bundle;
use crate::description::{GlobalWeaveDescription, ModeTag, WeaveDescription};
use crate::error::WeaveError;
use crate::storage::WeaveStorage;

/// Dispatches weaves to the applier for their mode and applies them at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeaveRegistry {
    head: HeadApplier,
    tail: TailApplier,
    insert: InsertApplier,
    global: GlobalApplier,
}

impl WeaveRegistry {
    /// Creates a registry with the standard appliers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head: HeadApplier,
            tail: TailApplier,
            insert: InsertApplier,
            global: GlobalApplier,
        }
    }

    /// Applies a method weave to `bundle`.
    ///
    /// # Errors
    ///
    /// Propagates the applier's failure; the bundle is then unchanged.
    pub fn register_weave(
        &self,
        bundle: &mut Bundle,
        weave: &WeaveDescription,
    ) -> Result<(), WeaveError> {
        match weave.at().tag() {
            ModeTag::Head => self.head.apply(bundle, weave),
            ModeTag::Tail => self.tail.apply(bundle, weave),
            ModeTag::Insert => self.insert.apply(bundle, weave),
        }
    }

    /// Applies a global weave to the free function `function` in `bundle`.
    ///
    /// # Errors
    ///
    /// Propagates the applier's failure; the bundle is then unchanged.
    pub fn register_global_weave(
        &self,
        bundle: &mut Bundle,
        weave: &GlobalWeaveDescription,
        function: &str,
    ) -> Result<(), WeaveError> {
        self.global.apply(bundle, weave, function)
    }
}

/// Exclusive weaving session over one bundle.
///
/// The session holds the only mutable borrow of its bundle for its lifetime,
/// consumes each description, and logs it once it has been applied.
#[derive(Debug)]
pub struct WeaveSession<'b> {
    bundle: &'b mut Bundle,
    registry: WeaveRegistry,
    storage: WeaveStorage,
}

impl<'b> WeaveSession<'b> {
    /// Opens a session on `bundle`.
    #[must_use]
    pub const fn new(bundle: &'b mut Bundle) -> Self {
        Self {
            bundle,
            registry: WeaveRegistry::new(),
            storage: WeaveStorage::new(),
        }
    }

    /// Applies and records a method weave.
    ///
    /// # Errors
    ///
    /// Propagates the applier's failure; nothing is recorded.
    pub fn weave(&mut self, weave: WeaveDescription) -> Result<(), WeaveError> {
        self.registry.register_weave(self.bundle, &weave)?;
        self.storage.add_weave(weave);
        Ok(())
    }

    /// Applies and records a global weave against its own function path.
    ///
    /// # Errors
    ///
    /// Propagates the applier's failure; nothing is recorded.
    pub fn global_weave(&mut self, weave: GlobalWeaveDescription) -> Result<(), WeaveError> {
        self.registry
            .register_global_weave(self.bundle, &weave, weave.function())?;
        self.storage.add_global_weave(weave);
        Ok(())
    }

    /// The bundle as woven so far.
    #[must_use]
    pub fn bundle(&self) -> &Bundle {
        self.bundle
    }

    /// Ends the session and returns its registration log.
    #[must_use]
    pub fn finish(self) -> WeaveStorage {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{InsertionMode, WeaveContent};

    fn code(method: &str, at: InsertionMode, text: &str) -> WeaveDescription {
        WeaveDescription::new(method, at, WeaveContent::Code(text.to_owned()))
    }

    #[test]
    fn weaves_compose_in_registration_order() {
        let mut bundle =
            Bundle::new("main.js", "function tick() { step(); }").expect("bundle");
        let mut session = WeaveSession::new(&mut bundle);
        session
            .weave(code("tick", InsertionMode::Head, "a();"))
            .expect("first");
        session
            .weave(code("tick", InsertionMode::Head, "b();"))
            .expect("second");
        session
            .weave(code("tick", InsertionMode::Tail, "c();"))
            .expect("third");
        let log = session.finish();

        assert_eq!(log.len(), 3);
        assert_eq!(bundle.source(), "function tick() {b();a(); step(); c();}");
    }

    #[test]
    fn failed_weaves_are_not_recorded() {
        let mut bundle = Bundle::new("main.js", "function tick() {}").expect("bundle");
        let mut session = WeaveSession::new(&mut bundle);
        let error = session
            .weave(code("tock", InsertionMode::Head, "a();"))
            .expect_err("missing target");

        assert!(matches!(error, WeaveError::TargetNotFound { .. }));
        assert!(session.finish().is_empty());
    }

    #[test]
    fn registry_dispatches_insert_weaves() {
        let mut bundle = Bundle::new("main.js", "function tick() { step(); }").expect("bundle");
        let at = InsertionMode::insert("step();").expect("valid");
        WeaveRegistry::new()
            .register_weave(&mut bundle, &code("tick", at, "after();"))
            .expect("applies");
        assert_eq!(bundle.source(), "function tick() { step();after(); }");
    }
}
