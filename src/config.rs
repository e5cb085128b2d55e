//! Generator configuration.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the gallery root next to the images it configures:
//!
//! ```text
//! gallery/
//! ├── config.toml              # Overrides stock defaults
//! ├── gallery.yaml             # The store (written by `generate`)
//! ├── kuku/
//! │   └── kuku-trees.jpg
//! └── backup/                  # Evicted when backup.prefix = "backup"
//!     └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! file = "gallery.yaml"     # Store file, relative to the gallery root
//!
//! [images]
//! max_dimension = 1920      # Longer edge limit for optimization
//! quality = 80              # JPEG re-encode quality (1-100)
//! optimize = true           # Downscale oversized images in place
//!
//! [backup]
//! # prefix = "backup"       # Relative path excluded from the gallery
//!
//! [processing]
//! batch_size = 8            # Files handed to the pool at once
//! # max_processes = 4       # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse: override just the values you want. Command-line
//! flags override the file, and the result is validated before any scanning.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::imaging::Quality;
use crate::process::ProcessOptions;
use crate::store::DEFAULT_STORE_FILE;

/// Name of the config file looked up in the gallery root.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub store: StoreConfig,
    pub images: ImagesConfig,
    pub backup: BackupConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "store.file must not be empty".into(),
            ));
        }
        if self.images.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "images.max_dimension must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.processing.batch_size == 0 {
            return Err(ConfigError::Validation(
                "processing.batch_size must be at least 1".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if let Some(prefix) = &self.backup.prefix {
            let trimmed = prefix.trim_matches('/');
            if trimmed.is_empty() || trimmed.split('/').any(|c| c.is_empty() || c == "." || c == "..") {
                return Err(ConfigError::Validation(format!(
                    "backup.prefix must be a relative directory path, got {prefix:?}"
                )));
            }
        }
        Ok(())
    }

    /// Path of the store for a gallery rooted at `root`.
    pub fn store_path(&self, root: &Path) -> PathBuf {
        root.join(&self.store.file)
    }

    /// Backup prefix with surrounding slashes removed.
    pub fn backup_prefix(&self) -> Option<&str> {
        self.backup.prefix.as_deref().map(|p| p.trim_matches('/'))
    }

    /// Processing knobs derived from this config.
    pub fn process_options(&self, use_cache: bool) -> ProcessOptions {
        ProcessOptions {
            optimize: self.images.optimize,
            max_dimension: self.images.max_dimension,
            quality: Quality::new(self.images.quality),
            batch_size: self.processing.batch_size,
            use_cache,
        }
    }
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Store file, relative to the gallery root.
    pub file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_STORE_FILE.to_string(),
        }
    }
}

/// In-place optimization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Longer-edge limit in pixels. Larger images are downscaled.
    pub max_dimension: u32,
    /// JPEG encoding quality (1 = worst, 100 = best). PNG is lossless.
    pub quality: u32,
    /// Whether `generate` optimizes images at all.
    pub optimize: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            quality: 80,
            optimize: true,
        }
    }
}

/// Backup namespace settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Relative path whose images and collections never reach the store.
    pub prefix: Option<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Files handed to the worker pool per batch.
    pub batch_size: usize,
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            batch_size: 8,
            max_processes: None,
        }
    }
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// Base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the gallery root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(root: &Path) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# photofolio Configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the gallery root as config.toml.
# Command-line flags override values set here.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Store
# ---------------------------------------------------------------------------
[store]
# Store file written by `generate`, relative to the gallery root.
file = "gallery.yaml"

# ---------------------------------------------------------------------------
# Image optimization
# ---------------------------------------------------------------------------
[images]
# Images whose longer edge exceeds this are downscaled in place.
max_dimension = 1920

# JPEG encoding quality (1 = worst, 100 = best). PNG is always lossless.
quality = 80

# Set to false to only read metadata and never touch image files.
optimize = true

# ---------------------------------------------------------------------------
# Backup namespace
# ---------------------------------------------------------------------------
[backup]
# Relative directory whose images and collections are kept out of the store.
# Entries already stored under it are removed on the next run.
# prefix = "backup"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Number of files handed to the worker pool at once.
batch_size = 8

# Maximum parallel image-processing workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
