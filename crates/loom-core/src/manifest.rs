//! Weave manifests and the load cycle that applies them to a source tree.
//!
//! A manifest lists mods in load order. Each mod names the bundles it
//! weaves and, per bundle, its method weaves and global weaves. The load
//! cycle applies method weaves before global weaves, in declaration order,
//! and stops at the first failure without touching the tree.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::{debug, info};

use crate::WEAVE_TARGET;
use crate::bundle::Bundle;
use crate::description::{GlobalWeaveDescription, WeaveDescription};
use crate::error::{LoadCycleError, LoadStep, WeaveError};
use crate::registry::WeaveSession;
use crate::storage::WeaveStorage;
use crate::tree::SourceTree;

/// All mods to weave, in load order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeaveManifest {
    #[serde(default)]
    mods: Vec<ModWeaves>,
}

/// One mod's weaves, grouped by bundle path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModWeaves {
    id: String,
    #[serde(default)]
    bundles: BTreeMap<Utf8PathBuf, BundleWeaves>,
}

/// Weaves one mod applies to one bundle.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleWeaves {
    #[serde(default)]
    weaves: Vec<WeaveDescription>,
    #[serde(default)]
    global_weaves: Vec<GlobalWeaveDescription>,
}

impl WeaveManifest {
    /// Parses a JSON manifest.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or on any invalid weave description.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Mods in load order.
    #[must_use]
    pub fn mods(&self) -> &[ModWeaves] {
        &self.mods
    }
}

impl ModWeaves {
    /// Mod identifier, used in diagnostics.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Weaves by bundle path.
    #[must_use]
    pub const fn bundles(&self) -> &BTreeMap<Utf8PathBuf, BundleWeaves> {
        &self.bundles
    }
}

impl BundleWeaves {
    /// Method weaves in declaration order.
    #[must_use]
    pub fn weaves(&self) -> &[WeaveDescription] {
        &self.weaves
    }

    /// Global weaves in declaration order.
    #[must_use]
    pub fn global_weaves(&self) -> &[GlobalWeaveDescription] {
        &self.global_weaves
    }
}

/// Options for a load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaveOptions {
    /// Re-parse each bundle after every rebind.
    pub verify_syntax: bool,
}

impl Default for WeaveOptions {
    fn default() -> Self {
        Self {
            verify_syntax: true,
        }
    }
}

/// Registration logs of a completed load cycle, one per woven bundle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    storages: BTreeMap<Utf8PathBuf, WeaveStorage>,
}

impl LoadReport {
    /// Registration log for `bundle`, if it was woven.
    #[must_use]
    pub fn storage(&self, bundle: &Utf8Path) -> Option<&WeaveStorage> {
        self.storages.get(bundle)
    }

    /// Number of bundles woven.
    #[must_use]
    pub fn bundle_count(&self) -> usize {
        self.storages.len()
    }

    /// Number of weaves applied across all bundles.
    #[must_use]
    pub fn weave_count(&self) -> usize {
        self.storages.values().map(WeaveStorage::len).sum()
    }
}

/// Applies every weave of `manifest` to `tree`.
///
/// Bundles are woven in memory and written back to `tree` only once every
/// weave has succeeded.
///
/// # Errors
///
/// Returns the first failure with the mod, bundle, and step that raised it.
pub fn apply_manifest(
    tree: &mut SourceTree,
    manifest: &WeaveManifest,
    options: WeaveOptions,
) -> Result<LoadReport, LoadCycleError> {
    let mut open: BTreeMap<Utf8PathBuf, (Bundle, WeaveStorage)> = BTreeMap::new();

    for entry in manifest.mods() {
        debug!(target: WEAVE_TARGET, mod_id = entry.id(), "loading mod");
        for (path, weaves) in entry.bundles() {
            let fail = |step: LoadStep, source: WeaveError| LoadCycleError {
                mod_id: entry.id().to_owned(),
                bundle: path.clone(),
                step,
                source: Box::new(source),
            };

            if !open.contains_key(path) {
                let bundle = tree
                    .open_bundle(path)
                    .map_err(|err| fail(LoadStep::Open, err))?
                    .with_syntax_verification(options.verify_syntax);
                open.insert(path.clone(), (bundle, WeaveStorage::new()));
            }
            let Some((bundle, storage)) = open.get_mut(path) else {
                continue;
            };

            let mut session = WeaveSession::new(bundle);
            for (index, weave) in weaves.weaves().iter().enumerate() {
                session
                    .weave(weave.clone())
                    .map_err(|err| fail(LoadStep::Method(index), err))?;
            }
            for (index, weave) in weaves.global_weaves().iter().enumerate() {
                session
                    .global_weave(weave.clone())
                    .map_err(|err| fail(LoadStep::Global(index), err))?;
            }
            storage.append(session.finish());
        }
    }

    let mut report = LoadReport::default();
    for (path, (bundle, storage)) in open {
        tree.store_bundle(bundle);
        report.storages.insert(path, storage);
    }
    info!(
        target: WEAVE_TARGET,
        weaves = report.weave_count(),
        bundles = report.bundle_count(),
        "load cycle complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::FileContent;
    use rstest::{fixture, rstest};

    const MAIN: &str = "class Car { update(dt) { this.x += dt; return this.x; } }\n";
    const SIM: &str = "function tick() { step(); step(); }\n";

    #[fixture]
    fn tree() -> SourceTree {
        let mut tree = SourceTree::new();
        tree.insert("main.js", FileContent::Text(MAIN.to_owned()));
        tree.insert("sim.js", FileContent::Text(SIM.to_owned()));
        tree
    }

    fn manifest(json: &str) -> WeaveManifest {
        WeaveManifest::from_json(json).expect("valid manifest")
    }

    #[rstest]
    fn applies_mods_in_order_and_reports_per_bundle(mut tree: SourceTree) {
        let manifest = manifest(
            r#"{ "mods": [
                { "id": "first", "bundles": {
                    "main.js": { "weaves": [
                        { "method": "Car.prototype.update", "at": "TAIL", "code": "a();" }
                    ] },
                    "sim.js": { "global_weaves": [
                        { "function": "tick", "target": "step();", "ordinal": 1, "code": "b();" }
                    ] }
                } },
                { "id": "second", "bundles": {
                    "main.js": { "weaves": [
                        { "method": "Car.update", "at": "HEAD", "code": "c();" }
                    ] }
                } }
            ] }"#,
        );

        let report = apply_manifest(&mut tree, &manifest, WeaveOptions::default())
            .expect("load cycle succeeds");

        assert_eq!(report.weave_count(), 3);
        assert_eq!(report.bundle_count(), 2);
        assert_eq!(
            report
                .storage(Utf8Path::new("main.js"))
                .map(WeaveStorage::len),
            Some(2)
        );
        assert_eq!(
            tree.get(Utf8Path::new("main.js")),
            Some(&FileContent::Text(
                "class Car { update(dt) {c(); this.x += dt; a();return this.x; } }\n".to_owned()
            ))
        );
        assert_eq!(
            tree.get(Utf8Path::new("sim.js")),
            Some(&FileContent::Text(
                "function tick() { step(); step();b(); }\n".to_owned()
            ))
        );
    }

    #[rstest]
    fn first_failure_aborts_without_writing(mut tree: SourceTree) {
        let manifest = manifest(
            r#"{ "mods": [ { "id": "broken", "bundles": { "main.js": { "weaves": [
                { "method": "Car.update", "at": "HEAD", "code": "ok();" },
                { "method": "Car.brake", "at": "HEAD", "code": "never();" }
            ] } } } ] }"#,
        );

        let error = apply_manifest(&mut tree, &manifest, WeaveOptions::default())
            .expect_err("missing target");

        assert_eq!(error.mod_id, "broken");
        assert_eq!(error.step, LoadStep::Method(1));
        assert!(matches!(*error.source, WeaveError::TargetNotFound { .. }));
        assert_eq!(
            tree.get(Utf8Path::new("main.js")),
            Some(&FileContent::Text(MAIN.to_owned()))
        );
    }

    #[rstest]
    fn missing_bundles_fail_when_opened(mut tree: SourceTree) {
        let manifest = manifest(r#"{ "mods": [ { "id": "m", "bundles": { "ui.js": {} } } ] }"#);
        let error = apply_manifest(&mut tree, &manifest, WeaveOptions::default())
            .expect_err("no such bundle");
        assert_eq!(error.step, LoadStep::Open);
        assert_eq!(
            error.to_string(),
            "mod 'm' failed at opening the bundle in ui.js: bundle not found in source tree: ui.js"
        );
    }

    #[test]
    fn invalid_descriptions_fail_at_parse_time() {
        let error = WeaveManifest::from_json(
            r#"{ "mods": [ { "id": "m", "bundles": { "main.js": { "weaves": [
                { "method": "f", "at": "MIDDLE", "code": "x();" }
            ] } } } ] }"#,
        )
        .expect_err("bad mode");
        assert!(error.to_string().contains("unknown mode tag 'MIDDLE'"));
    }
}
