//! Image I/O: dimensions, camera metadata and in-place optimization.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **EXIF** | `kamadak-exif` container reader |
//! | **Resize** | Lanczos3, re-encoded as JPEG (quality) or PNG (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
mod exif_reader;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, RawExif};
pub use calculations::calculate_fit_dimensions;
pub use exif_reader::{insert_exif_segment, read_exif_block, read_raw_exif};
pub use operations::{OptimizeOutcome, get_dimensions, optimize_image};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
