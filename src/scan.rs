//! Directory scanning.
//!
//! Walks a gallery root and finds every image that belongs in the store.
//! Directories double as collections:
//!
//! ```text
//! gallery/                         # Gallery root
//! ├── config.toml                  # Generator configuration (optional)
//! ├── gallery.yaml                 # The store (written by `generate`)
//! ├── landscape.jpg                # Image without a collection
//! ├── kuku/                        # Collection "kuku"
//! │   ├── kuku-trees.jpg
//! │   └── kuku-bubble.jpg
//! ├── travel/japan/                # Collection "travel/japan"
//! │   └── tokyo.png
//! ├── backup/                      # Backup namespace (when configured): skipped
//! │   └── kuku/old.jpg
//! └── .drafts/                     # Hidden: skipped
//! ```
//!
//! ## Rules
//!
//! - Only `jpg`, `jpeg` and `png` files are images (extension case-insensitive)
//! - Hidden files and directories (leading `.`) are skipped
//! - The backup namespace is never descended into
//! - Results are sorted by file name at every level, so repeated scans of an
//!   unchanged tree produce identical output

use indexmap::IndexSet;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::naming::parent_dir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Find every image under `root`, depth-first, sorted by name.
///
/// When `exclude_prefix` is set, the directory tree it names (relative to
/// `root`) is left out.
pub fn scan_images(root: &Path, exclude_prefix: Option<&str>) -> Result<Vec<PathBuf>, ScanError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(root, entry, exclude_prefix));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if is_image(entry.path()) {
            debug!("Found image {}", entry.path().display());
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Collection ids implied by `files`: each distinct parent directory,
/// relative to `root`, in first-appearance order.
///
/// Files directly in `root` imply no collection. Directories inside the
/// backup namespace are left out.
pub fn collection_ids(root: &Path, files: &[PathBuf], exclude_prefix: Option<&str>) -> Vec<String> {
    let mut ids = IndexSet::new();
    for file in files {
        let Some(rel) = relative_posix(root, file) else {
            continue;
        };
        let Some(dir) = parent_dir(&rel) else {
            continue;
        };
        if exclude_prefix.is_some_and(|prefix| in_namespace(dir, prefix)) {
            continue;
        }
        ids.insert(dir.to_string());
    }
    ids.into_iter().collect()
}

/// `path` relative to `root` with `/` separators, or `None` when `path` is
/// not under `root`. The root itself maps to `""`.
pub fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

/// Whether the posix relative path `id` lies inside the `prefix` namespace.
///
/// Matches whole path components: with prefix `backup`, both `backup` and
/// `backup/kuku` are inside, `backups` is not. An empty prefix matches nothing.
pub fn in_namespace(id: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match id.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn keep_entry(root: &Path, entry: &DirEntry, exclude_prefix: Option<&str>) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if entry.file_name().to_string_lossy().starts_with('.') {
        return false;
    }
    match (exclude_prefix, entry.file_type().is_dir()) {
        (Some(prefix), true) => relative_posix(root, entry.path())
            .is_none_or(|rel| !in_namespace(&rel, prefix)),
        _ => true,
    }
}

fn is_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
