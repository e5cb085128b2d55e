//! Shared test utilities for the photofolio test suite.
//!
//! Provides synthetic image writers (with optional EXIF), a fixture gallery
//! and lookup helpers over [`GalleryData`].
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = setup_gallery();
//! let data = generate(&RustBackend::new(), tmp.path(), &config, GenerateOptions::default())
//!     .unwrap()
//!     .data;
//!
//! let image = find_image(&data, "kuku/kuku-trees.jpg");
//! assert_eq!(image.meta.title, "Kuku Trees");
//! ```

use std::io::Cursor;
use std::path::Path;

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{ImageFormat, RgbImage};
use tempfile::TempDir;

use crate::imaging::insert_exif_segment;
use crate::types::{Collection, GalleryData, GalleryImage};

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a small valid JPEG with the given dimensions.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Jpeg)
        .unwrap();
}

/// Write a small valid PNG with the given dimensions.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// EXIF fields to embed in a synthetic JPEG. Rationals are `(num, denom)`.
#[derive(Debug, Clone, Default)]
pub struct ExifFixture {
    pub date_time_original: Option<&'static str>,
    pub f_number: Option<(u32, u32)>,
    pub focal_length: Option<(u32, u32)>,
    pub iso: Option<u16>,
    pub exposure_time: Option<(u32, u32)>,
    pub model: Option<&'static str>,
    pub lens_model: Option<&'static str>,
}

impl ExifFixture {
    /// The camera data of `kuku/kuku-trees.jpg`.
    pub fn leica_q3() -> Self {
        Self {
            date_time_original: Some("2025:02:21 09:17:14"),
            f_number: Some((8, 1)),
            focal_length: Some((28, 1)),
            iso: Some(100),
            exposure_time: Some((1, 640)),
            model: Some("LEICA Q3"),
            lens_model: Some("SUMMILUX 1:1.7/28 ASPH."),
        }
    }

    fn fields(&self) -> Vec<Field> {
        let ascii = |tag, s: &str| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![s.as_bytes().to_vec()]),
        };
        let rational = |tag, (num, denom): (u32, u32)| Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Rational(vec![Rational { num, denom }]),
        };

        let mut fields = Vec::new();
        if let Some(s) = self.date_time_original {
            fields.push(ascii(Tag::DateTimeOriginal, s));
        }
        if let Some(r) = self.f_number {
            fields.push(rational(Tag::FNumber, r));
        }
        if let Some(r) = self.focal_length {
            fields.push(rational(Tag::FocalLength, r));
        }
        if let Some(iso) = self.iso {
            fields.push(Field {
                tag: Tag::PhotographicSensitivity,
                ifd_num: In::PRIMARY,
                value: Value::Short(vec![iso]),
            });
        }
        if let Some(r) = self.exposure_time {
            fields.push(rational(Tag::ExposureTime, r));
        }
        if let Some(s) = self.model {
            fields.push(ascii(Tag::Model, s));
        }
        if let Some(s) = self.lens_model {
            fields.push(ascii(Tag::LensModel, s));
        }
        fields
    }
}

/// Encode `fixture` as a TIFF-structured EXIF block.
fn exif_block(fixture: &ExifFixture) -> Vec<u8> {
    let fields = fixture.fields();
    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).unwrap();
    buf.into_inner()
}

/// Write a JPEG carrying an APP1 EXIF segment built from `fixture`.
pub fn write_test_jpeg_with_exif(path: &Path, width: u32, height: u32, fixture: &ExifFixture) {
    let mut jpeg = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut jpeg, ImageFormat::Jpeg)
        .unwrap();
    let jpeg = jpeg.into_inner();

    let out = insert_exif_segment(&jpeg, &exif_block(fixture)).unwrap();
    std::fs::write(path, out).unwrap();
}

// =========================================================================
// Fixture gallery
// =========================================================================

/// Build a small gallery in a temp directory:
///
/// ```text
/// kuku/kuku-trees.jpg    LEICA Q3, 2025-02-21T09:17:14Z
/// kuku/kuku-bubble.jpg   2024-06-01T12:00:00Z
/// popo/popo-view.jpg     no EXIF
/// landscape.jpg          no EXIF, no collection
/// ```
pub fn setup_gallery() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::create_dir_all(root.join("kuku")).unwrap();
    std::fs::create_dir_all(root.join("popo")).unwrap();

    write_test_jpeg_with_exif(
        &root.join("kuku/kuku-trees.jpg"),
        64,
        48,
        &ExifFixture::leica_q3(),
    );
    write_test_jpeg_with_exif(
        &root.join("kuku/kuku-bubble.jpg"),
        48,
        64,
        &ExifFixture {
            date_time_original: Some("2024:06:01 12:00:00"),
            f_number: Some((28, 10)),
            ..ExifFixture::default()
        },
    );
    write_test_jpeg(&root.join("popo/popo-view.jpg"), 64, 64);
    write_test_jpeg(&root.join("landscape.jpg"), 80, 40);
    tmp
}

// =========================================================================
// GalleryData lookups (panic with a clear message on miss)
// =========================================================================

/// Find an image by path. Panics if not found.
pub fn find_image<'a>(data: &'a GalleryData, path: &str) -> &'a GalleryImage {
    data.images
        .iter()
        .find(|i| i.path == path)
        .unwrap_or_else(|| panic!("image '{path}' not found. Available: {:?}", image_paths(data)))
}

/// Find a collection by id. Panics if not found.
pub fn find_collection<'a>(data: &'a GalleryData, id: &str) -> &'a Collection {
    data.collections
        .iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| {
            panic!(
                "collection '{id}' not found. Available: {:?}",
                collection_ids(data)
            )
        })
}

/// All image paths, in store order.
pub fn image_paths(data: &GalleryData) -> Vec<&str> {
    data.images.iter().map(|i| i.path.as_str()).collect()
}

/// All collection ids, in store order.
pub fn collection_ids(data: &GalleryData) -> Vec<&str> {
    data.collections.iter().map(|c| c.id.as_str()).collect()
}
