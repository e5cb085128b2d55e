//! Query layer: the read path a presentation layer uses.
//!
//! [`get_images`] loads the store, validates it, filters by collection,
//! optionally sorts by capture date, and joins each entry to its decoded
//! [`Asset`]. [`get_collections`] returns the declared collections.
//!
//! ## Failure model
//!
//! Store problems are fatal to the call and surface as [`ImageStoreError`]:
//! a missing or malformed file, or an image referencing a collection that
//! does not exist. An entry whose asset cannot be found is not fatal; it is
//! logged and left out, and the remaining images are returned.
//!
//! ## Sorting
//!
//! Sorting and ordering are independent. `sort_by` orders ascending by
//! capture date, with undated images treated as the Unix epoch (so they
//! come first). `order: Desc` then reverses whatever sequence results,
//! which without `sort_by` simply reverses store order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::assets::{Asset, AssetSource, asset_key};
use crate::store;
use crate::types::{Collection, GalleryData, GalleryImage, ImageExif};

/// Store path used when none is given.
pub const DEFAULT_STORE_PATH: &str = "src/gallery/gallery.yaml";

/// Virtual collection every image may reference without declaring it.
pub const FEATURED_COLLECTION_ID: &str = "featured";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageStoreError {
    #[error("Failed to load gallery data from {path}: {cause}")]
    Load { path: PathBuf, cause: String },
    #[error("Invalid collection(s) [{}] referenced in image: {image}", .ids.join(", "))]
    InvalidCollections { image: String, ids: Vec<String> },
}

/// Sortable image properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortKey {
    CaptureDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct GetImagesOptions {
    pub store_path: PathBuf,
    /// Only images in this collection. Empty means no filter.
    pub collection: Option<String>,
    pub sort_by: Option<SortKey>,
    pub order: Order,
}

impl Default for GetImagesOptions {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            collection: None,
            sort_by: None,
            order: Order::Asc,
        }
    }
}

/// Camera metadata with the capture date resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedExif {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub f_number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,
}

impl From<&ImageExif> for ProcessedExif {
    fn from(exif: &ImageExif) -> Self {
        Self {
            focal_length: exif.focal_length,
            iso: exif.iso,
            f_number: exif.f_number,
            shutter_speed: exif.shutter_speed,
            capture_date: exif.capture_date.as_ref().and_then(|d| d.to_datetime()),
            model: exif.model.clone(),
            lens_model: exif.lens_model.clone(),
        }
    }
}

/// An image ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub src: Asset,
    pub title: String,
    pub description: String,
    pub collections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<ProcessedExif>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub film_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analog: Option<bool>,
}

/// Load, filter, sort and resolve the images of a store.
pub fn get_images(
    options: &GetImagesOptions,
    assets: &impl AssetSource,
) -> Result<Vec<Image>, ImageStoreError> {
    let data = load_gallery_data(&options.store_path)?;

    let mut images: Vec<&GalleryImage> = match options.collection.as_deref() {
        Some(id) if !id.is_empty() => data
            .images
            .iter()
            .filter(|image| image.meta.collections.iter().any(|c| c == id))
            .collect(),
        _ => data.images.iter().collect(),
    };

    if options.sort_by == Some(SortKey::CaptureDate) {
        images.sort_by_key(|image| capture_timestamp(image));
    }
    if options.order == Order::Desc {
        images.reverse();
    }

    let store_dir = options.store_path.parent().unwrap_or(Path::new(""));
    Ok(images
        .into_iter()
        .filter_map(|image| resolve_image(store_dir, image, assets))
        .collect())
}

/// The collections declared in the store, in store order.
pub fn get_collections(store_path: &Path) -> Result<Vec<Collection>, ImageStoreError> {
    Ok(load_gallery_data(store_path)?.collections)
}

/// Load the store and check every image references known collections.
pub fn load_gallery_data(store_path: &Path) -> Result<GalleryData, ImageStoreError> {
    let data = store::load(store_path).map_err(|e| ImageStoreError::Load {
        path: store_path.to_path_buf(),
        cause: e.to_string(),
    })?;
    validate(&data)?;
    Ok(data)
}

/// Every collection id an image references must be declared or `featured`.
pub fn validate(data: &GalleryData) -> Result<(), ImageStoreError> {
    let known: HashSet<&str> = data
        .collections
        .iter()
        .map(|c| c.id.as_str())
        .chain([FEATURED_COLLECTION_ID])
        .collect();

    for image in &data.images {
        let invalid: Vec<String> = image
            .meta
            .collections
            .iter()
            .filter(|id| !known.contains(id.as_str()))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(ImageStoreError::InvalidCollections {
                image: image.path.clone(),
                ids: invalid,
            });
        }
    }
    Ok(())
}

/// Milliseconds since the epoch; undated or unparseable is 0.
fn capture_timestamp(image: &GalleryImage) -> i64 {
    image
        .exif
        .as_ref()
        .and_then(|exif| exif.capture_date.as_ref())
        .and_then(|date| date.to_datetime())
        .map(|date| date.timestamp_millis())
        .unwrap_or(0)
}

fn resolve_image(store_dir: &Path, image: &GalleryImage, assets: &impl AssetSource) -> Option<Image> {
    let key = asset_key(&store_dir.join(&image.path));
    let Some(asset) = assets.resolve(&key) else {
        warn!("Image not found: {}", key);
        return None;
    };

    Some(Image {
        src: asset.clone(),
        title: image.meta.title.clone(),
        description: image.meta.description.clone(),
        collections: image.meta.collections.clone(),
        exif: image.exif.as_ref().map(ProcessedExif::from),
        film_type: image.meta.film_type.clone(),
        analog: image.meta.analog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetIndex;
    use crate::types::{CaptureDate, Meta};
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn entry(path: &str, collections: &[&str], date: Option<CaptureDate>) -> GalleryImage {
        GalleryImage {
            path: path.into(),
            meta: Meta {
                title: path.into(),
                description: String::new(),
                collections: collections.iter().map(|c| c.to_string()).collect(),
                film_type: None,
                analog: None,
            },
            exif: Some(ImageExif {
                capture_date: date,
                ..Default::default()
            }),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Option<CaptureDate> {
        Some(CaptureDate::Date(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()))
    }

    fn collection(id: &str) -> Collection {
        Collection {
            id: id.into(),
            name: id.into(),
        }
    }

    /// Write `data` as a store in a temp dir and index an asset for every
    /// image except those listed in `missing`.
    fn setup(data: &GalleryData, missing: &[&str]) -> (TempDir, PathBuf, AssetIndex) {
        let tmp = TempDir::new().unwrap();
        let store_path = tmp.path().join("gallery.yaml");
        store::save(&store_path, data).unwrap();

        let assets = AssetIndex::from_assets(
            data.images
                .iter()
                .filter(|i| !missing.contains(&i.path.as_str()))
                .map(|i| Asset {
                    src: asset_key(&tmp.path().join(&i.path)),
                    width: 100,
                    height: 80,
                    format: "jpg".into(),
                }),
        );
        (tmp, store_path, assets)
    }

    fn sample() -> GalleryData {
        GalleryData {
            collections: vec![collection("kuku"), collection("popo")],
            images: vec![
                entry("kuku/kuku-trees.jpg", &["kuku", "featured"], date(2025, 2, 21)),
                entry("kuku/kuku-bubble.jpg", &["kuku"], date(2024, 6, 1)),
                entry("popo/popo-view.jpg", &["popo"], None),
                entry("landscape.jpg", &[], date(2023, 1, 1)),
            ],
        }
    }

    fn titles(images: &[Image]) -> Vec<&str> {
        images.iter().map(|i| i.title.as_str()).collect()
    }

    fn options(store_path: &Path) -> GetImagesOptions {
        GetImagesOptions {
            store_path: store_path.to_path_buf(),
            ..GetImagesOptions::default()
        }
    }

    // =========================================================================
    // get_images
    // =========================================================================

    #[test]
    fn returns_all_images_in_store_order() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let images = get_images(&options(&store_path), &assets).unwrap();
        assert_eq!(
            titles(&images),
            vec![
                "kuku/kuku-trees.jpg",
                "kuku/kuku-bubble.jpg",
                "popo/popo-view.jpg",
                "landscape.jpg"
            ]
        );
    }

    #[test]
    fn filters_by_collection() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            collection: Some("kuku".into()),
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(titles(&images), vec!["kuku/kuku-trees.jpg", "kuku/kuku-bubble.jpg"]);
    }

    #[test]
    fn filters_by_featured() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            collection: Some(FEATURED_COLLECTION_ID.into()),
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(titles(&images), vec!["kuku/kuku-trees.jpg"]);
    }

    #[test]
    fn empty_collection_filter_means_all() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            collection: Some(String::new()),
            ..options(&store_path)
        };
        assert_eq!(get_images(&opts, &assets).unwrap().len(), 4);
    }

    #[test]
    fn sorts_by_capture_date_with_undated_first() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            sort_by: Some(SortKey::CaptureDate),
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(
            titles(&images),
            vec![
                "popo/popo-view.jpg",
                "landscape.jpg",
                "kuku/kuku-bubble.jpg",
                "kuku/kuku-trees.jpg"
            ]
        );
    }

    #[test]
    fn sort_desc_puts_newest_first() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            sort_by: Some(SortKey::CaptureDate),
            order: Order::Desc,
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(
            titles(&images),
            vec![
                "kuku/kuku-trees.jpg",
                "kuku/kuku-bubble.jpg",
                "landscape.jpg",
                "popo/popo-view.jpg"
            ]
        );
    }

    #[test]
    fn desc_without_sort_reverses_store_order() {
        let (_tmp, store_path, assets) = setup(&sample(), &[]);
        let opts = GetImagesOptions {
            order: Order::Desc,
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(
            titles(&images),
            vec![
                "landscape.jpg",
                "popo/popo-view.jpg",
                "kuku/kuku-bubble.jpg",
                "kuku/kuku-trees.jpg"
            ]
        );
    }

    #[test]
    fn textual_dates_sort_like_structured_ones() {
        let data = GalleryData {
            collections: vec![],
            images: vec![
                entry("b.jpg", &[], Some(CaptureDate::Text("2024:06:01 12:00:00".into()))),
                entry("a.jpg", &[], Some(CaptureDate::Text("2020-01-01".into()))),
                entry("c.jpg", &[], Some(CaptureDate::Text("whenever".into()))),
            ],
        };
        let (_tmp, store_path, assets) = setup(&data, &[]);
        let opts = GetImagesOptions {
            sort_by: Some(SortKey::CaptureDate),
            ..options(&store_path)
        };
        let images = get_images(&opts, &assets).unwrap();
        assert_eq!(titles(&images), vec!["c.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(images[0].exif.as_ref().unwrap().capture_date, None);
    }

    #[test]
    fn missing_asset_is_skipped() {
        let (_tmp, store_path, assets) = setup(&sample(), &["popo/popo-view.jpg"]);
        let images = get_images(&options(&store_path), &assets).unwrap();
        assert_eq!(images.len(), 3);
        assert!(!titles(&images).contains(&"popo/popo-view.jpg"));
    }

    #[test]
    fn resolved_image_carries_asset_and_meta() {
        let mut data = sample();
        data.images[0].meta.description = "Morning".into();
        data.images[0].meta.film_type = Some("HP5".into());
        data.images[0].meta.analog = Some(true);
        let (tmp, store_path, assets) = setup(&data, &[]);

        let images = get_images(&options(&store_path), &assets).unwrap();
        let trees = &images[0];
        assert_eq!(
            trees.src.src,
            asset_key(&tmp.path().join("kuku/kuku-trees.jpg"))
        );
        assert_eq!((trees.src.width, trees.src.height), (100, 80));
        assert_eq!(trees.description, "Morning");
        assert_eq!(trees.collections, vec!["kuku", "featured"]);
        assert_eq!(trees.film_type.as_deref(), Some("HP5"));
        assert_eq!(trees.analog, Some(true));
        assert_eq!(
            trees.exif.as_ref().unwrap().capture_date,
            Some(Utc.with_ymd_and_hms(2025, 2, 21, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn image_without_exif_has_none() {
        let mut data = sample();
        data.images[3].exif = None;
        let (_tmp, store_path, assets) = setup(&data, &[]);
        let images = get_images(&options(&store_path), &assets).unwrap();
        assert_eq!(images[3].exif, None);
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn unknown_collection_is_rejected() {
        let mut data = sample();
        data.images[1].meta.collections = vec!["kuku".into(), "nope".into(), "gone".into()];
        let (_tmp, store_path, assets) = setup(&data, &[]);

        let err = get_images(&options(&store_path), &assets).unwrap_err();
        assert_eq!(
            err,
            ImageStoreError::InvalidCollections {
                image: "kuku/kuku-bubble.jpg".into(),
                ids: vec!["nope".into(), "gone".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "Invalid collection(s) [nope, gone] referenced in image: kuku/kuku-bubble.jpg"
        );
    }

    #[test]
    fn missing_store_is_load_error() {
        let tmp = TempDir::new().unwrap();
        let store_path = tmp.path().join("gallery.yaml");
        let err = get_images(&options(&store_path), &AssetIndex::default()).unwrap_err();
        assert!(matches!(err, ImageStoreError::Load { .. }));
        assert!(err.to_string().starts_with("Failed to load gallery data from"));
    }

    #[test]
    fn malformed_store_is_load_error() {
        let tmp = TempDir::new().unwrap();
        let store_path = tmp.path().join("gallery.yaml");
        fs::write(&store_path, "images: [").unwrap();
        let err = get_collections(&store_path).unwrap_err();
        assert!(matches!(err, ImageStoreError::Load { .. }));
    }

    // =========================================================================
    // get_collections
    // =========================================================================

    #[test]
    fn collections_in_store_order() {
        let (_tmp, store_path, _) = setup(&sample(), &[]);
        let ids: Vec<String> = get_collections(&store_path)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["kuku", "popo"]);
    }

    #[test]
    fn collections_also_validate_images() {
        let mut data = sample();
        data.images[0].meta.collections = vec!["ghost".into()];
        let (_tmp, store_path, _) = setup(&data, &[]);
        assert!(matches!(
            get_collections(&store_path),
            Err(ImageStoreError::InvalidCollections { .. })
        ));
    }

    #[test]
    fn default_store_path() {
        assert_eq!(
            GetImagesOptions::default().store_path,
            PathBuf::from("src/gallery/gallery.yaml")
        );
        assert_eq!(GetImagesOptions::default().order, Order::Asc);
    }
}
