//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Identify | `image::image_dimensions` (header only) |
//! | EXIF | `kamadak-exif` via [`read_raw_exif`](super::exif_reader::read_raw_exif) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at the requested quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |
//!
//! A resized JPEG gets the source's EXIF block back as an APP1 segment, so
//! optimizing in place never loses camera data. PNG output is written
//! without it; the optimization cache keeps the EXIF of those files.

use super::backend::{BackendError, Dimensions, ImageBackend, RawExif};
use super::exif_reader::{insert_exif_segment, read_exif_block, read_raw_exif};
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tracing::warn;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save a DynamicImage to the given path, inferring format from extension.
///
/// `exif` is a raw TIFF-structured block to embed where the format allows.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    quality: u32,
    exif: Option<&[u8]>,
) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, path, quality, exif),
        "png" => save_png(img, path),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

fn save_jpeg(
    img: &DynamicImage,
    path: &Path,
    quality: u32,
    exif: Option<&[u8]>,
) -> Result<(), BackendError> {
    let mut encoded = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100) as u8);
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    let encoded = encoded.into_inner();

    let bytes = match exif {
        Some(block) => insert_exif_segment(&encoded, block).unwrap_or_else(|| {
            warn!("EXIF block of {} too large to keep", path.display());
            encoded
        }),
        None => encoded,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

fn save_png(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let writer = BufWriter::new(File::create(path)?);
    img.write_with_encoder(PngEncoder::new(writer))
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_exif(&self, path: &Path) -> Result<Option<RawExif>, BackendError> {
        read_raw_exif(path)
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let exif = read_exif_block(&params.source);
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(
            &resized,
            &params.output,
            params.quality.value(),
            exif.as_deref(),
        )
    }
}
