//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the generator and
//! the asset index need: identify, read_exif, and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! recording [`MockBackend`](tests::MockBackend).

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// EXIF values as read from the file, before any cleaning.
///
/// Numbers may be NaN or infinite (zero denominators are common in the wild)
/// and strings may be empty. [`crate::entity::clean_exif`] turns this into
/// the stored [`ImageExif`](crate::types::ImageExif).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExif {
    /// `DateTimeOriginal`, verbatim (`YYYY:MM:DD HH:MM:SS`).
    pub date_time_original: Option<String>,
    pub f_number: Option<f64>,
    pub focal_length: Option<f64>,
    /// `PhotographicSensitivity` (ISO speed).
    pub iso: Option<f64>,
    /// Exposure time in seconds.
    pub exposure_time: Option<f64>,
    pub model: Option<String>,
    pub lens_model: Option<String>,
}

/// Trait for image processing backends.
///
/// Everything outside `imaging` goes through this trait so the pipeline can
/// run against a mock.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the EXIF block. `Ok(None)` when the file carries none.
    fn read_exif(&self, path: &Path) -> Result<Option<RawExif>, BackendError>;

    /// Execute a resize operation.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
