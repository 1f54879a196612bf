//! In-memory source tree produced by the patch pipeline.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::bundle::Bundle;
use crate::error::WeaveError;

/// Contents of one file in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// Valid UTF-8 text; may be opened as a bundle.
    Text(String),
    /// Anything else; passed through untouched.
    Binary(Vec<u8>),
}

impl FileContent {
    /// Classifies raw bytes as text when they are valid UTF-8.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        String::from_utf8(bytes).map_or_else(|err| Self::Binary(err.into_bytes()), Self::Text)
    }

    /// Raw bytes of the file.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Relative path to content mapping, ordered by path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceTree {
    files: BTreeMap<Utf8PathBuf, FileContent>,
}

impl SourceTree {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            files: BTreeMap::new(),
        }
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<Utf8PathBuf>, content: FileContent) {
        self.files.insert(path.into(), content);
    }

    /// Looks up a file.
    #[must_use]
    pub fn get(&self, path: &Utf8Path) -> Option<&FileContent> {
        self.files.get(path)
    }

    /// Iterates files in path order.
    pub fn files(&self) -> impl Iterator<Item = (&Utf8Path, &FileContent)> {
        self.files.iter().map(|(path, content)| (path.as_path(), content))
    }

    /// Number of files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` for an empty tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Opens the text file at `path` as a bundle.
    ///
    /// # Errors
    ///
    /// Returns [`WeaveError::BundleNotFound`] or [`WeaveError::BinaryBundle`]
    /// when the path cannot be woven, or a syntax error for an unsupported
    /// extension.
    pub fn open_bundle(&self, path: &Utf8Path) -> Result<Bundle, WeaveError> {
        match self.files.get(path) {
            Some(FileContent::Text(text)) => Bundle::new(path, text.clone()),
            Some(FileContent::Binary(_)) => Err(WeaveError::BinaryBundle {
                path: path.to_owned(),
            }),
            None => Err(WeaveError::BundleNotFound {
                path: path.to_owned(),
            }),
        }
    }

    /// Writes a woven bundle back under its own path.
    pub fn store_bundle(&mut self, bundle: Bundle) {
        let path = bundle.path().to_owned();
        self.files.insert(path, FileContent::Text(bundle.into_source()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> SourceTree {
        let mut tree = SourceTree::new();
        tree.insert("main.js", FileContent::from_bytes(b"function f() {}".to_vec()));
        tree.insert("logo.png", FileContent::from_bytes(vec![0x89, 0x50, 0xff, 0x00]));
        tree
    }

    #[test]
    fn classifies_files_by_encoding() {
        let files = tree();
        assert!(matches!(
            files.get(Utf8Path::new("main.js")),
            Some(FileContent::Text(_))
        ));
        assert!(matches!(
            files.get(Utf8Path::new("logo.png")),
            Some(FileContent::Binary(_))
        ));
    }

    #[test]
    fn only_text_files_open_as_bundles() {
        let files = tree();
        assert!(files.open_bundle(Utf8Path::new("main.js")).is_ok());
        assert!(matches!(
            files.open_bundle(Utf8Path::new("logo.png")),
            Err(WeaveError::BinaryBundle { .. })
        ));
        assert!(matches!(
            files.open_bundle(Utf8Path::new("sim.js")),
            Err(WeaveError::BundleNotFound { .. })
        ));
    }

    #[test]
    fn stored_bundles_replace_their_file() {
        let mut files = tree();
        let mut bundle = files.open_bundle(Utf8Path::new("main.js")).expect("text");
        let binding = bundle.resolve("f").expect("resolves");
        bundle.rebind(&binding, "function f() { g(); }").expect("valid");
        files.store_bundle(bundle);

        assert_eq!(
            files.get(Utf8Path::new("main.js")),
            Some(&FileContent::Text("function f() { g(); }".to_owned()))
        );
        assert_eq!(files.len(), 2);
    }
}
