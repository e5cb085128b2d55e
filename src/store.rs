//! Store I/O: reading and writing `gallery.yaml`.
//!
//! The store is a single YAML document holding [`GalleryData`]. It is meant
//! to be edited by hand between runs, so it is written with stable ordering
//! and without machine-only noise (absent EXIF fields are omitted).
//!
//! Writes go to a hidden sibling file that is then renamed over the target.
//! A crash mid-write leaves the previous store intact, and readers never see
//! a half-written document.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::types::GalleryData;

/// Default store file name inside the gallery root.
pub const DEFAULT_STORE_FILE: &str = "gallery.yaml";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Failed to serialize gallery data: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Read and parse the store at `path`.
pub fn load(path: &Path) -> Result<GalleryData, StoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_yaml::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// [`load`], treating a missing file as an empty gallery.
pub fn load_or_default(path: &Path) -> Result<GalleryData, StoreError> {
    match load(path) {
        Err(StoreError::NotFound(_)) => {
            debug!("No store at {}, starting empty", path.display());
            Ok(GalleryData::default())
        }
        other => other,
    }
}

/// Serialize `data` to `path`, replacing any previous store atomically.
pub fn save(path: &Path, data: &GalleryData) -> Result<(), StoreError> {
    let yaml = to_yaml(data)?;
    let tmp = temp_path(path);
    let write = || -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, path)
    };
    write().map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Render `data` as the store's YAML text.
pub fn to_yaml(data: &GalleryData) -> Result<String, StoreError> {
    Ok(serde_yaml::to_string(data)?)
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_STORE_FILE.to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
