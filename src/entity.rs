//! Entity factory: turns files and directories into store records.
//!
//! A freshly scanned image gets
//!
//! - `path`: relative to the gallery root, `/`-separated
//! - `meta.title`: readable caption of the file stem (`kuku-trees.jpg` → "Kuku Trees")
//! - `meta.description`: empty
//! - `meta.collections`: the parent directory, or nothing at the root
//! - `exif`: cleaned camera data, always present (possibly empty)
//!
//! A collection gets its directory path as id and a readable caption as name.
//!
//! EXIF is never trusted raw. [`clean_exif`] drops NaN and infinite numbers,
//! empty strings and unparseable dates, so the store only ever holds values a
//! reader can use as-is.

use std::path::Path;

use tracing::warn;

use crate::imaging::{ImageBackend, RawExif};
use crate::naming::{collection_ids_for, file_stem, to_readable_caption};
use crate::scan::relative_posix;
use crate::types::{
    CaptureDate, Collection, GalleryImage, ImageExif, Meta, parse_capture_date,
};

/// Build a store record for `file`, reading its EXIF through `backend`.
///
/// Never fails: an unreadable EXIF block is logged and stored as empty.
pub fn create_image_entity(
    backend: &impl ImageBackend,
    root: &Path,
    file: &Path,
) -> GalleryImage {
    image_entity_with_exif(root, file, extract_exif(backend, file))
}

/// Build a store record for `file` from EXIF that was already extracted.
pub fn image_entity_with_exif(root: &Path, file: &Path, exif: ImageExif) -> GalleryImage {
    let path = relative_posix(root, file)
        .unwrap_or_else(|| file.to_string_lossy().replace('\\', "/"));

    GalleryImage {
        meta: Meta {
            title: to_readable_caption(file_stem(&path)),
            description: String::new(),
            collections: collection_ids_for(&path),
            film_type: None,
            analog: None,
        },
        exif: Some(exif),
        path,
    }
}

/// Build a collection record for a directory id such as `kuku` or `travel/japan`.
pub fn create_collection_entity(dir: &str) -> Collection {
    Collection {
        id: dir.to_string(),
        name: to_readable_caption(dir),
    }
}

/// Read and clean the EXIF of `file`. Read errors degrade to empty EXIF.
pub fn extract_exif(backend: &impl ImageBackend, file: &Path) -> ImageExif {
    match backend.read_exif(file) {
        Ok(Some(raw)) => clean_exif(&raw),
        Ok(None) => ImageExif::default(),
        Err(e) => {
            warn!("Failed to read EXIF from {}: {}", file.display(), e);
            ImageExif::default()
        }
    }
}

/// Turn raw EXIF values into the stored form.
///
/// - numbers must be finite; ISO must also fit a `u32` and is rounded
/// - `shutterSpeed` is `1 / exposureTime`, only for a strictly positive exposure
/// - `DateTimeOriginal` is read as UTC; any offset tag is ignored
/// - blank strings are dropped
pub fn clean_exif(raw: &RawExif) -> ImageExif {
    ImageExif {
        focal_length: finite(raw.focal_length),
        iso: finite(raw.iso)
            .filter(|iso| *iso >= 0.0 && *iso <= u32::MAX as f64)
            .map(|iso| iso.round() as u32),
        f_number: finite(raw.f_number),
        shutter_speed: finite(raw.exposure_time)
            .filter(|t| *t > 0.0)
            .and_then(|t| finite(Some(1.0 / t))),
        capture_date: raw
            .date_time_original
            .as_deref()
            .and_then(parse_capture_date)
            .map(CaptureDate::from),
        model: non_blank(raw.model.as_deref()),
        lens_model: non_blank(raw.lens_model.as_deref()),
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
