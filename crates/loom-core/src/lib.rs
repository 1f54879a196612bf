//! Ahead-of-time method weaving for compiled script bundles.
//!
//! A weave splices new statements into an existing function without access
//! to the project that produced it. The engine works on the text of the
//! patched tree: it locates the target by binding path, splits its text into
//! parameters and body, splices generated content at the requested point,
//! and rebinds the reconstituted declaration in place.
//!
//! The pieces, leaves first:
//!
//! - [`SplitFunction`] splits and reconstitutes function text.
//! - [`find_occurrence_ends`], [`splice_at`] and
//!   [`find_own_scope_return_offset`] resolve insertion points.
//! - [`method_weave_text`] and [`global_weave_text`] generate woven code,
//!   including the cancellation scaffolding.
//! - [`HeadApplier`], [`TailApplier`], [`InsertApplier`] and
//!   [`GlobalApplier`] rewrite one target each.
//! - [`WeaveRegistry`] dispatches by mode; [`WeaveSession`] owns a bundle
//!   for one load cycle and logs into a [`WeaveStorage`].
//! - [`apply_manifest`] runs a whole [`WeaveManifest`] over a
//!   [`SourceTree`].
//!
//! # Example
//!
//! ```
//! use loom_core::{Bundle, InsertionMode, WeaveContent, WeaveDescription, WeaveSession};
//!
//! let mut bundle = Bundle::new("main.js", "function run() { a(); return b(); }")?;
//! let mut session = WeaveSession::new(&mut bundle);
//! session.weave(WeaveDescription::new(
//!     "run",
//!     InsertionMode::Tail,
//!     WeaveContent::Code("log();".to_owned()),
//! ))?;
//! let log = session.finish();
//!
//! assert_eq!(log.len(), 1);
//! assert_eq!(bundle.source(), "function run() { a(); log();return b(); }");
//! # Ok::<(), loom_core::WeaveError>(())
//! ```

mod appliers;
mod bundle;
mod description;
mod error;
mod generator;
mod manifest;
mod registry;
mod resolver;
mod splitter;
mod storage;
mod tree;

/// Tracing target for weave application events.
pub(crate) const WEAVE_TARGET: &str = "loom::weave";

pub use appliers::{GlobalApplier, HeadApplier, InsertApplier, TailApplier, WeaveApplier};
pub use bundle::{Binding, Bundle};
pub use description::{
    GlobalWeaveDescription, InsertionMode, InvocationInfo, ModeTag, WeaveContent,
    WeaveDescription,
};
pub use error::{LoadCycleError, LoadStep, WeaveError};
pub use generator::{global_content, global_weave_text, method_content, method_weave_text};
pub use manifest::{
    BundleWeaves, LoadReport, ModWeaves, WeaveManifest, WeaveOptions, apply_manifest,
};
pub use registry::{WeaveRegistry, WeaveSession};
pub use resolver::{find_occurrence_ends, find_own_scope_return_offset, splice_at};
pub use splitter::SplitFunction;
pub use storage::WeaveStorage;
pub use tree::{FileContent, SourceTree};

#[cfg(test)]
mod tests;
