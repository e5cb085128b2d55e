//! Persisted gallery data model.
//!
//! These types are the on-disk schema of the gallery store (`gallery.yaml`).
//! The generator writes them, photographers hand-edit them, and the query
//! layer reads them back, so field names follow the store's camelCase keys.
//!
//! ```yaml
//! collections:
//! - id: kuku
//!   name: Kuku
//! images:
//! - path: kuku/kuku-trees.jpg
//!   meta:
//!     title: Kuku Trees
//!     description: ''
//!     collections:
//!     - kuku
//!   exif:
//!     focalLength: 28.0
//!     iso: 100
//!     fNumber: 8.0
//!     shutterSpeed: 640.0
//!     captureDate: 2025-02-21T09:17:14Z
//!     model: LEICA Q3
//!     lensModel: SUMMILUX 1:1.7/28 ASPH.
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// The whole store: every collection and every image, in store order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryData {
    pub collections: Vec<Collection>,
    pub images: Vec<GalleryImage>,
}

impl GalleryData {
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.images.is_empty()
    }
}

/// A named group of images, usually derived from a directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable key (the directory path relative to the gallery root).
    pub id: String,
    /// Display label. Derived once, then owned by the user.
    pub name: String,
}

/// One image entry in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImage {
    /// Posix path relative to the gallery root. Unique across the store.
    pub path: String,
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ImageExif>,
}

/// User-owned fields of an image. Never overwritten by a rescan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub collections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analog: Option<bool>,
}

/// Camera metadata as stored. Machine-owned, replaced on every scan.
///
/// Every field is either absent or a valid value; the entity factory never
/// stores NaN, infinities or empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageExif {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    /// Hand-edited stores may write it as a float (`100.0`); it is rounded.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_iso"
    )]
    pub iso: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_date: Option<CaptureDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens_model: Option<String>,
}

impl ImageExif {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Any finite number in `u32` range, rounded. Out-of-range values read as absent.
fn deserialize_iso<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|iso| iso.is_finite() && *iso >= 0.0 && *iso <= u32::MAX as f64)
        .map(|iso| iso.round() as u32))
}

/// Capture date as found in the store.
///
/// Freshly scanned dates are structured; hand-edited stores may contain any
/// textual form. Both are resolved by [`CaptureDate::to_datetime`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureDate {
    Date(DateTime<Utc>),
    Text(String),
}

impl CaptureDate {
    /// Normalize to a concrete UTC date-time. Unparseable text yields `None`.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            CaptureDate::Date(date) => Some(*date),
            CaptureDate::Text(text) => parse_capture_date(text),
        }
    }
}

impl From<DateTime<Utc>> for CaptureDate {
    fn from(date: DateTime<Utc>) -> Self {
        CaptureDate::Date(date)
    }
}

/// Naive layouts accepted in hand-edited stores, all read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y:%m:%d %H:%M:%S",
];

/// Parse a textual capture date.
///
/// RFC 3339 strings keep their offset (converted to UTC). Naive date-times,
/// including the EXIF `YYYY:MM:DD HH:MM:SS` layout, are interpreted as UTC.
/// A bare `YYYY-MM-DD` means midnight UTC.
pub fn parse_capture_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
