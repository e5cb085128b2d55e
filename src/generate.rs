//! Generation pipeline.
//!
//! One `generate` run turns a directory of images into an up-to-date store:
//!
//! ```text
//! gallery root ──scan──▶ files ──process──▶ EXIF (+ optimized files)
//!                                              │
//!                          entity factory ◀────┘
//!                                │
//!   gallery.yaml ──load──▶ reconcile ◀── scanned GalleryData
//!        ▲                     │
//!        └───────save──────────┘
//! ```
//!
//! The root is checked before anything is read or written, so a typo on the
//! command line never creates a stray store or cache file. Per-file problems
//! are degraded inside [`process`](crate::process); everything that reaches
//! [`GenerateError`] aborts the run before the store is replaced.

use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::info;

use crate::cache::CacheStats;
use crate::config::{Config, ConfigError};
use crate::entity::{create_collection_entity, image_entity_with_exif};
use crate::imaging::ImageBackend;
use crate::process::{self, ProcessError, ProcessEvent, ProcessedImage};
use crate::reconcile::{ReconcileOptions, ReconcileSummary, reconcile_with_summary};
use crate::scan::{self, ScanError};
use crate::store::{self, StoreError};
use crate::types::GalleryData;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Invalid directory path provided: {0}")]
    InvalidRoot(PathBuf),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-run switches that are not part of `config.toml`.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Start from the on-disk optimization cache.
    pub use_cache: bool,
    /// Receives progress while images are processed.
    pub progress: Option<Sender<ProcessEvent>>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            progress: None,
        }
    }
}

/// What a run did.
#[derive(Debug)]
pub struct GenerateReport {
    pub store_path: PathBuf,
    pub summary: ReconcileSummary,
    pub cache_stats: CacheStats,
    /// Per-file results, in scan order.
    pub images: Vec<ProcessedImage>,
    /// The store as written.
    pub data: GalleryData,
}

/// Run the full pipeline for the gallery at `root`.
pub fn generate(
    backend: &impl ImageBackend,
    root: &Path,
    config: &Config,
    options: GenerateOptions,
) -> Result<GenerateReport, GenerateError> {
    if !root.is_dir() {
        return Err(GenerateError::InvalidRoot(root.to_path_buf()));
    }
    config.validate()?;

    let backup_prefix = config.backup_prefix();
    let files = scan::scan_images(root, backup_prefix)?;
    info!("Found {} images under {}", files.len(), root.display());

    let processed = process::process_images(
        backend,
        root,
        &files,
        &config.process_options(options.use_cache),
        options.progress,
    )?;

    let scanned = GalleryData {
        collections: scan::collection_ids(root, &files, backup_prefix)
            .iter()
            .map(|id| create_collection_entity(id))
            .collect(),
        images: processed
            .images
            .iter()
            .map(|image| image_entity_with_exif(root, &image.path, image.exif.clone()))
            .collect(),
    };

    let store_path = config.store_path(root);
    let existing = store::load_or_default(&store_path)?;
    if existing.is_empty() {
        info!("Starting a new store at {}", store_path.display());
    }
    let (data, summary) = reconcile_with_summary(&existing, &scanned, ReconcileOptions { backup_prefix });
    store::save(&store_path, &data)?;
    info!(
        "Wrote {} images and {} collections to {}",
        data.images.len(),
        data.collections.len(),
        store_path.display()
    );

    Ok(GenerateReport {
        store_path,
        summary,
        cache_stats: processed.cache_stats,
        images: processed.images,
        data,
    })
}
