//! Per-image processing: EXIF extraction and optional optimization.
//!
//! Runs between the scan and the reconciliation. For every scanned file, in
//! scan order:
//!
//! 1. Hash the file. If the [cache](crate::cache) recognises it as one we
//!    processed earlier, take its EXIF from the cache (PNG output does not
//!    carry it). Otherwise read EXIF from the file.
//! 2. If optimization is on and the cache does not already vouch for the file
//!    under the current parameters, shrink it in place so its longer edge fits
//!    `max_dimension`.
//!
//! ## Failure model
//!
//! Nothing per-file aborts the run. Unreadable EXIF becomes empty EXIF and a
//! failed optimization leaves the original file untouched; both are logged
//! and reported as [`ImageStatus`]. Only failing to persist the cache is an
//! error, because losing it means losing the EXIF of optimized images.
//!
//! ## Parallel Processing
//!
//! Files are handled in batches of `batch_size`. Each batch runs on the
//! [rayon](https://docs.rs/rayon) pool and is collected before the next one
//! starts, which bounds the number of decoded images held in memory. Results
//! come back in scan order regardless of which thread finished first.

use crate::cache::{self, CacheEntry, CacheManifest, CacheStats};
use crate::entity::extract_exif;
use crate::imaging::{ImageBackend, OptimizeOutcome, Quality, optimize_image};
use crate::scan::relative_posix;
use crate::types::ImageExif;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to write cache {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Settings for a processing run.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub optimize: bool,
    pub max_dimension: u32,
    pub quality: Quality,
    pub batch_size: usize,
    /// Skip files the cache vouches for. When false every file is checked
    /// again, but remembered EXIF is still used.
    pub use_cache: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            max_dimension: 1920,
            quality: Quality::default(),
            batch_size: 8,
            use_cache: true,
        }
    }
}

/// What happened to one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// Resized and re-encoded in place.
    Optimized { from: (u32, u32), to: (u32, u32) },
    /// Already processed with the current parameters.
    Cached,
    /// Checked and already small enough.
    WithinBounds,
    /// Optimization is disabled.
    Skipped,
    /// Optimization failed; the file is unchanged.
    Failed(String),
}

/// A scanned file after processing.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub path: PathBuf,
    /// Path relative to the gallery root, `/`-separated.
    pub relative: String,
    pub exif: ImageExif,
    pub status: ImageStatus,
}

/// Progress events, sent while processing runs.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        batch: usize,
        batches: usize,
        size: usize,
    },
    ImageProcessed {
        /// 1-based position in scan order.
        index: usize,
        total: usize,
        path: String,
        status: ImageStatus,
    },
}

#[derive(Debug)]
pub struct ProcessResult {
    /// One entry per input file, in input order.
    pub images: Vec<ProcessedImage>,
    pub cache_stats: CacheStats,
}

/// Process `files` (all under `root`) and update the cache in `root`.
///
/// `progress`, when given, receives a [`ProcessEvent`] per batch and per
/// image.
pub fn process_images(
    backend: &impl ImageBackend,
    root: &Path,
    files: &[PathBuf],
    options: &ProcessOptions,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<ProcessResult, ProcessError> {
    let mut cache = CacheManifest::load(root);
    let params_hash = cache::hash_optimize_params(options.max_dimension, options.quality.value());

    let batch_size = options.batch_size.max(1);
    let batches = files.len().div_ceil(batch_size);
    let total = files.len();
    info!(
        "Processing {} images in {} batches of up to {}",
        total, batches, batch_size
    );

    let mut images = Vec::with_capacity(total);
    let mut stats = CacheStats::default();

    for (batch_index, batch) in files.chunks(batch_size).enumerate() {
        if let Some(tx) = &progress {
            tx.send(ProcessEvent::BatchStarted {
                batch: batch_index + 1,
                batches,
                size: batch.len(),
            })
            .ok();
        }

        let offset = batch_index * batch_size;
        let outcomes: Vec<(ProcessedImage, Option<CacheEntry>)> = batch
            .par_iter()
            .enumerate()
            .map(|(i, file)| {
                let outcome = process_one(backend, root, file, &cache, &params_hash, options);
                if let Some(tx) = &progress {
                    tx.send(ProcessEvent::ImageProcessed {
                        index: offset + i + 1,
                        total,
                        path: outcome.0.relative.clone(),
                        status: outcome.0.status.clone(),
                    })
                    .ok();
                }
                outcome
            })
            .collect();

        for (image, entry) in outcomes {
            match &image.status {
                ImageStatus::Optimized { .. } => stats.optimized += 1,
                ImageStatus::Cached => stats.cached += 1,
                ImageStatus::WithinBounds => stats.unchanged += 1,
                ImageStatus::Failed(_) => stats.failed += 1,
                ImageStatus::Skipped => {}
            }
            match entry {
                Some(CacheEntry {
                    output_hash,
                    params_hash: entry_params,
                    exif,
                }) => cache.insert(image.relative.clone(), output_hash, entry_params, exif),
                None => cache.remove(&image.relative),
            }
            images.push(image);
        }
    }

    let live: HashSet<String> = images.iter().map(|i| i.relative.clone()).collect();
    cache.retain_paths(&live);

    let cache_file = cache::cache_path(root);
    if !cache.entries.is_empty() || cache_file.exists() {
        cache
            .save(root)
            .map_err(|source| ProcessError::CacheWrite {
                path: cache_file,
                source,
            })?;
    }

    Ok(ProcessResult {
        images,
        cache_stats: stats,
    })
}

/// Process a single file. Returns the image and the cache entry it should
/// have afterwards (`None` to forget it).
fn process_one(
    backend: &impl ImageBackend,
    root: &Path,
    file: &Path,
    cache: &CacheManifest,
    params_hash: &str,
    options: &ProcessOptions,
) -> (ProcessedImage, Option<CacheEntry>) {
    let relative =
        relative_posix(root, file).unwrap_or_else(|| file.to_string_lossy().into_owned());

    let hash = match cache::hash_file(file) {
        Ok(h) => Some(h),
        Err(e) => {
            warn!("Failed to hash {}: {}", file.display(), e);
            None
        }
    };
    let cached = hash.as_deref().and_then(|h| cache.lookup(&relative, h));
    let exif = match cached {
        Some(entry) => {
            debug!("Using cached EXIF for {}", relative);
            entry.exif.clone()
        }
        None => extract_exif(backend, file),
    };

    let done = |status, entry| {
        (
            ProcessedImage {
                path: file.to_path_buf(),
                relative: relative.clone(),
                exif: exif.clone(),
                status,
            },
            entry,
        )
    };

    if !options.optimize {
        return done(ImageStatus::Skipped, cached.cloned());
    }
    if let Some(entry) = cached.filter(|e| options.use_cache && e.params_hash == params_hash) {
        return done(ImageStatus::Cached, Some(entry.clone()));
    }

    let entry_for = |output_hash: String| CacheEntry {
        output_hash,
        params_hash: params_hash.to_string(),
        exif: exif.clone(),
    };

    match optimize_image(backend, file, options.max_dimension, options.quality) {
        Ok(OptimizeOutcome::Resized { from, to }) => {
            debug!(
                "Optimized {} from {}x{} to {}x{}",
                relative, from.0, from.1, to.0, to.1
            );
            let entry = match cache::hash_file(file) {
                Ok(h) => Some(entry_for(h)),
                Err(e) => {
                    warn!("Failed to hash {} after optimizing: {}", file.display(), e);
                    None
                }
            };
            done(ImageStatus::Optimized { from, to }, entry)
        }
        Ok(OptimizeOutcome::WithinBounds { .. }) => {
            done(ImageStatus::WithinBounds, hash.map(entry_for))
        }
        Err(e) => {
            warn!("Failed to optimize {}: {}", file.display(), e);
            done(ImageStatus::Failed(e.to_string()), cached.cloned())
        }
    }
}
