//! Optimization cache for incremental generation.
//!
//! Optimizing re-encodes images in place, which costs time and drops any
//! EXIF the output format cannot hold (JPEG keeps it, PNG does not). The
//! cache records what each processed file looked like when we last wrote it,
//! so the next run can
//!
//! 1. recognise a file it already processed and skip re-encoding it, and
//! 2. recover camera metadata a re-encoded file no longer carries.
//!
//! ## Cache keys
//!
//! Entries are keyed by the image path relative to the gallery root.
//!
//! - **`output_hash`**: SHA-256 of the file as it was left on disk after
//!   processing. Content-based rather than mtime-based so it survives
//!   `git checkout` and copies. If the photographer replaces the file, the
//!   hash no longer matches and the entry is ignored.
//!
//! - **`params_hash`**: SHA-256 of (max dimension, quality). When the
//!   configuration changes the file is re-checked, but its remembered EXIF is
//!   still used.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<gallery>/.photofolio-cache.json`. The
//! leading dot keeps it out of scans.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to `generate` to check every file again. The cache is
//! still read for EXIF and rewritten afterwards, so bypassing it never loses
//! remembered camera data.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::ImageExif;

/// Name of the cache file within the gallery root.
const CACHE_FILENAME: &str = ".photofolio-cache.json";

/// Version of the cache format. Bump this to invalidate all existing caches
/// when the format or key computation changes.
const CACHE_VERSION: u32 = 1;

/// What we know about one processed image.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct CacheEntry {
    pub output_hash: String,
    pub params_hash: String,
    /// Cleaned EXIF read from the file before it was re-encoded.
    #[serde(default)]
    pub exif: ImageExif,
}

/// On-disk cache mapping relative image paths to their entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty cache (the first run, or an unreadable cache file).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the gallery root. Returns an empty cache if the file doesn't
    /// exist or can't be parsed (version mismatch, corruption).
    pub fn load(root: &Path) -> Self {
        let path = cache_path(root);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        let manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                debug!("Ignoring unreadable cache {}: {}", path.display(), e);
                return Self::empty();
            }
        };
        if manifest.version != CACHE_VERSION {
            return Self::empty();
        }
        manifest
    }

    /// Save to the gallery root.
    pub fn save(&self, root: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(root), json)
    }

    /// The entry for `path`, provided the file on disk still hashes to what
    /// we wrote.
    pub fn lookup(&self, path: &str, current_hash: &str) -> Option<&CacheEntry> {
        self.entries
            .get(path)
            .filter(|entry| entry.output_hash == current_hash)
    }

    /// Record (or replace) the entry for `path`.
    pub fn insert(&mut self, path: String, output_hash: String, params_hash: String, exif: ImageExif) {
        self.entries.insert(
            path,
            CacheEntry {
                output_hash,
                params_hash,
                exif,
            },
        );
    }

    /// Forget `path`.
    pub fn remove(&mut self, path: &str) {
        self.entries.remove(path);
    }

    /// Drop entries for images that are no longer in the gallery.
    pub fn retain_paths(&mut self, live: &HashSet<String>) {
        self.entries.retain(|path, _| live.contains(path));
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 hash of the optimization parameters.
pub fn hash_optimize_params(max_dimension: u32, quality: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"optimize\0");
    hasher.update(max_dimension.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Resolve the cache file path for a gallery root.
pub fn cache_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILENAME)
}

/// Summary of a processing run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Already processed with the current parameters.
    pub cached: u32,
    /// Resized and re-encoded this run.
    pub optimized: u32,
    /// Checked and found within bounds.
    pub unchanged: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.cached + self.optimized + self.unchanged + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cached > 0 {
            write!(
                f,
                "{} cached, {} optimized, {} within bounds",
                self.cached, self.optimized, self.unchanged
            )?;
        } else {
            write!(
                f,
                "{} optimized, {} within bounds",
                self.optimized, self.unchanged
            )?;
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        write!(f, " ({} total)", self.total())
    }
}
