//! Reconciliation: merging a fresh scan into the persisted store.
//!
//! The store has two owners. The generator owns `exif` and the existence of
//! entries; the photographer owns `meta` and collection names. Every run
//! merges the scanned tree into what was persisted without losing either
//! side's work:
//!
//! | Field | Existing entry | New entry |
//! |---|---|---|
//! | `image.meta` | kept as stored | derived from the file |
//! | `image.exif` | replaced by the scan | from the scan |
//! | `collection.name` | kept as stored | derived from the directory |
//!
//! ## Ordering
//!
//! Existing entries keep their store position; new entries are appended in
//! scan order. The merge is keyed by `IndexMap`, so this falls out of
//! insertion order.
//!
//! ## Stale entries
//!
//! Entries whose file disappeared are kept. Removing them would throw away
//! hand-written descriptions whenever a file is moved temporarily.
//!
//! ## Backup namespace
//!
//! With a backup prefix configured, every image path and collection id inside
//! that namespace is dropped from both sides, so a `backup/` directory never
//! leaks into the published gallery even if an older run stored it.
//!
//! The merge is pure: inputs are borrowed and never modified, and the same
//! inputs always produce the same output. Running it twice with the same scan
//! is a no-op.

use indexmap::IndexMap;
use tracing::debug;

use crate::scan::in_namespace;
use crate::types::{Collection, GalleryData, GalleryImage};

/// Knobs for [`reconcile`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions<'a> {
    /// Evict everything under this relative path (e.g. `"backup"`).
    pub backup_prefix: Option<&'a str>,
}

/// Counts describing what a reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub images_added: usize,
    pub images_refreshed: usize,
    pub images_evicted: usize,
    pub collections_added: usize,
    pub collections_evicted: usize,
}

/// Merge `scanned` into `existing`. See the [module docs](self) for the rules.
pub fn reconcile(
    existing: &GalleryData,
    scanned: &GalleryData,
    options: ReconcileOptions<'_>,
) -> GalleryData {
    reconcile_with_summary(existing, scanned, options).0
}

/// [`reconcile`], also reporting what changed.
pub fn reconcile_with_summary(
    existing: &GalleryData,
    scanned: &GalleryData,
    options: ReconcileOptions<'_>,
) -> (GalleryData, ReconcileSummary) {
    let evicted = |key: &str| {
        options
            .backup_prefix
            .is_some_and(|prefix| in_namespace(key, prefix))
    };
    let mut summary = ReconcileSummary::default();

    let mut images: IndexMap<&str, GalleryImage> = IndexMap::new();
    for image in &existing.images {
        if evicted(&image.path) {
            debug!("Evicting backup image {}", image.path);
            summary.images_evicted += 1;
            continue;
        }
        images.insert(&image.path, image.clone());
    }
    for image in scanned.images.iter().filter(|i| !evicted(&i.path)) {
        match images.get_mut(image.path.as_str()) {
            Some(stored) => {
                stored.exif = image.exif.clone();
                summary.images_refreshed += 1;
            }
            None => {
                images.insert(&image.path, image.clone());
                summary.images_added += 1;
            }
        }
    }

    let mut collections: IndexMap<&str, Collection> = IndexMap::new();
    for collection in &existing.collections {
        if evicted(&collection.id) {
            debug!("Evicting backup collection {}", collection.id);
            summary.collections_evicted += 1;
            continue;
        }
        collections.insert(&collection.id, collection.clone());
    }
    for collection in scanned.collections.iter().filter(|c| !evicted(&c.id)) {
        if !collections.contains_key(collection.id.as_str()) {
            collections.insert(&collection.id, collection.clone());
            summary.collections_added += 1;
        }
    }

    let data = GalleryData {
        collections: collections.into_values().collect(),
        images: images.into_values().collect(),
    };
    (data, summary)
}
