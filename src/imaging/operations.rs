//! High-level image operations.
//!
//! These functions combine calculations with backend execution.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_fit_dimensions;
use super::params::{Quality, ResizeParams};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// What [`optimize_image`] did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizeOutcome {
    Resized { from: (u32, u32), to: (u32, u32) },
    WithinBounds { dimensions: (u32, u32) },
}

/// Plan the resize for `path`, or `None` if it already fits.
pub fn plan_optimization(
    path: &Path,
    original: (u32, u32),
    max_dimension: u32,
    quality: Quality,
) -> Option<ResizeParams> {
    let (width, height) = calculate_fit_dimensions(original, max_dimension)?;
    Some(ResizeParams {
        source: path.to_path_buf(),
        output: temp_sibling(path),
        width,
        height,
        quality,
    })
}

/// Shrink an image in place so its longer edge is at most `max_dimension`.
///
/// The resized copy is written next to the original under a hidden name and
/// then renamed over it, so the original is either intact or fully replaced.
/// Images already within bounds are not touched.
pub fn optimize_image(
    backend: &impl ImageBackend,
    path: &Path,
    max_dimension: u32,
    quality: Quality,
) -> Result<OptimizeOutcome> {
    let original = get_dimensions(backend, path)?;
    let Some(params) = plan_optimization(path, original, max_dimension, quality) else {
        return Ok(OptimizeOutcome::WithinBounds {
            dimensions: original,
        });
    };

    if let Err(e) = backend.resize(&params) {
        let _ = std::fs::remove_file(&params.output);
        return Err(e);
    }
    std::fs::rename(&params.output, path)?;

    Ok(OptimizeOutcome::Resized {
        from: original,
        to: (params.width, params.height),
    })
}

/// `dir/photo.jpg` → `dir/.photo.optimizing.jpg`
///
/// Keeps the extension so the backend picks the same encoder, and the leading
/// dot keeps the scanner away from it.
fn temp_sibling(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!(".{stem}.optimizing.{}", ext.to_string_lossy()),
        None => format!(".{stem}.optimizing"),
    };
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1920,
            height: 1080,
        }]);

        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn temp_sibling_is_hidden_and_keeps_extension() {
        assert_eq!(
            temp_sibling(Path::new("/g/kuku/kuku-trees.jpg")),
            PathBuf::from("/g/kuku/.kuku-trees.optimizing.jpg")
        );
    }

    #[test]
    fn plan_optimization_within_bounds_is_none() {
        assert!(plan_optimization(Path::new("/a.jpg"), (800, 600), 1920, Quality::default()).is_none());
    }

    #[test]
    fn plan_optimization_targets_temp_sibling() {
        let params =
            plan_optimization(Path::new("/g/a.png"), (4000, 2000), 1000, Quality::new(70)).unwrap();
        assert_eq!(params.source, PathBuf::from("/g/a.png"));
        assert_eq!(params.output, PathBuf::from("/g/.a.optimizing.png"));
        assert_eq!((params.width, params.height), (1000, 500));
        assert_eq!(params.quality.value(), 70);
    }

    #[test]
    fn optimize_within_bounds_only_identifies() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1024,
            height: 768,
        }]);

        let outcome =
            optimize_image(&backend, Path::new("/g/a.jpg"), 1920, Quality::default()).unwrap();

        assert_eq!(
            outcome,
            OptimizeOutcome::WithinBounds {
                dimensions: (1024, 768)
            }
        );
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn optimize_resizes_and_replaces_in_place() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("big.jpg");
        std::fs::write(&path, b"original").unwrap();

        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 4000,
            height: 3000,
        }]);
        let outcome = optimize_image(&backend, &path, 1920, Quality::new(85)).unwrap();

        assert_eq!(
            outcome,
            OptimizeOutcome::Resized {
                from: (4000, 3000),
                to: (1920, 1440)
            }
        );
        assert!(path.exists());
        assert!(!tmp.path().join(".big.optimizing.jpg").exists());

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize { width: 1920, height: 1440, quality: 85, output, .. }
                if output.ends_with(".big.optimizing.jpg")
        ));
    }

    #[test]
    fn optimize_propagates_identify_failure() {
        let backend = MockBackend::new();
        let result = optimize_image(&backend, Path::new("/g/a.jpg"), 1920, Quality::default());
        assert!(result.is_err());
    }
}
