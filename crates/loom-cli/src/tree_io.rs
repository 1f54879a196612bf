//! Reading and writing source trees through capability-scoped directories.

use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use loom_core::{FileContent, SourceTree, WeaveManifest};
use tracing::debug;

use crate::errors::AppError;

fn read_error(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
    move |source| AppError::ReadTree {
        path: path.to_owned(),
        source,
    }
}

fn write_error(path: &Utf8Path) -> impl FnOnce(std::io::Error) -> AppError + '_ {
    move |source| AppError::WriteTree {
        path: path.to_owned(),
        source,
    }
}

/// Reads every regular file under `root` into a tree keyed by relative path.
pub(crate) fn read_tree(root: &Utf8Path) -> Result<SourceTree, AppError> {
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(read_error(root))?;
    let mut tree = SourceTree::new();
    collect(&dir, root, Utf8Path::new(""), &mut tree)?;
    debug!(root = %root, files = tree.len(), "read source tree");
    Ok(tree)
}

fn collect(
    dir: &Dir,
    root: &Utf8Path,
    prefix: &Utf8Path,
    tree: &mut SourceTree,
) -> Result<(), AppError> {
    let location = root.join(prefix);
    for item in dir.entries().map_err(read_error(&location))? {
        let entry = item.map_err(read_error(&location))?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|raw| AppError::NonUtf8Path {
                parent: location.clone(),
                name: raw.to_string_lossy().into_owned(),
            })?;
        let relative = prefix.join(&name);
        let file_type = entry.file_type().map_err(read_error(&location))?;

        if file_type.is_dir() {
            let child = entry.open_dir().map_err(read_error(&location))?;
            collect(&child, root, &relative, tree)?;
        } else if file_type.is_file() {
            let mut bytes = Vec::new();
            entry
                .open()
                .and_then(|mut file| file.read_to_end(&mut bytes))
                .map_err(read_error(&location))?;
            tree.insert(relative, FileContent::from_bytes(bytes));
        } else {
            debug!(path = %relative, "skipping non-regular file");
        }
    }
    Ok(())
}

/// Reads a single file of the tree.
pub(crate) fn read_file(root: &Utf8Path, relative: &Utf8Path) -> Result<SourceTree, AppError> {
    let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(read_error(root))?;
    let full = root.join(relative);
    let bytes = dir.read(relative).map_err(read_error(&full))?;
    let mut tree = SourceTree::new();
    tree.insert(relative, FileContent::from_bytes(bytes));
    Ok(tree)
}

/// Parses the JSON manifest at `path`.
pub(crate) fn read_manifest(path: &Utf8Path) -> Result<WeaveManifest, AppError> {
    let (parent, name) = split_parent(path);
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error(path))?;
    let text = dir.read_to_string(name).map_err(read_error(path))?;
    WeaveManifest::from_json(&text).map_err(|source| AppError::ParseManifest {
        path: path.to_owned(),
        source,
    })
}

/// Writes every file of `tree` under `out`, creating directories as needed.
pub(crate) fn write_tree(out: &Utf8Path, tree: &SourceTree) -> Result<(), AppError> {
    Dir::create_ambient_dir_all(out, ambient_authority()).map_err(write_error(out))?;
    let dir = Dir::open_ambient_dir(out, ambient_authority()).map_err(write_error(out))?;
    for (relative, content) in tree.files() {
        let full: Utf8PathBuf = out.join(relative);
        if let Some(parent) = relative.parent().filter(|parent| !parent.as_str().is_empty()) {
            dir.create_dir_all(parent).map_err(write_error(&full))?;
        }
        dir.write(relative, content.as_bytes())
            .map_err(write_error(&full))?;
    }
    debug!(out = %out, files = tree.len(), "wrote source tree");
    Ok(())
}

fn split_parent(path: &Utf8Path) -> (&Utf8Path, &str) {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    (parent, path.file_name().unwrap_or_default())
}
