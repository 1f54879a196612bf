//! Append-only log of applied weaves.

use crate::description::{GlobalWeaveDescription, WeaveDescription};

/// Ordered registration log for one bundle.
///
/// Entries are never deduplicated or removed; registering the same
/// description twice records it twice.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WeaveStorage {
    weaves: Vec<WeaveDescription>,
    global_weaves: Vec<GlobalWeaveDescription>,
}

impl WeaveStorage {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            weaves: Vec::new(),
            global_weaves: Vec::new(),
        }
    }

    /// Appends a method weave.
    pub fn add_weave(&mut self, weave: WeaveDescription) {
        self.weaves.push(weave);
    }

    /// Appends a global weave.
    pub fn add_global_weave(&mut self, weave: GlobalWeaveDescription) {
        self.global_weaves.push(weave);
    }

    /// Appends every entry of `other`, keeping its order.
    pub fn append(&mut self, other: Self) {
        self.weaves.extend(other.weaves);
        self.global_weaves.extend(other.global_weaves);
    }

    /// Method weaves in registration order.
    #[must_use]
    pub fn weaves(&self) -> &[WeaveDescription] {
        &self.weaves
    }

    /// Global weaves in registration order.
    #[must_use]
    pub fn global_weaves(&self) -> &[GlobalWeaveDescription] {
        &self.global_weaves
    }

    /// Total number of recorded weaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weaves.len().saturating_add(self.global_weaves.len())
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weaves.is_empty() && self.global_weaves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{InsertionMode, WeaveContent};

    #[test]
    fn duplicates_are_kept_in_order() {
        let weave = WeaveDescription::new(
            "tick",
            InsertionMode::Head,
            WeaveContent::Code("a();".to_owned()),
        );
        let mut storage = WeaveStorage::new();
        storage.add_weave(weave.clone());
        storage.add_weave(weave.clone());

        assert_eq!(storage.weaves(), [weave.clone(), weave]);
        assert_eq!(storage.len(), 2);
        assert!(storage.global_weaves().is_empty());
    }
}
