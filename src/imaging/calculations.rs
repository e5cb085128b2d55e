//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions that fit `original` inside a `max_dimension` square.
///
/// Returns `None` when the longer edge is already within bounds, meaning the
/// image should be left alone. Otherwise the longer edge becomes exactly
/// `max_dimension` and the shorter edge is scaled and rounded, never below 1.
///
/// # Examples
/// ```
/// # use photofolio::imaging::calculate_fit_dimensions;
/// assert_eq!(calculate_fit_dimensions((4000, 3000), 1920), Some((1920, 1440)));
/// assert_eq!(calculate_fit_dimensions((1200, 800), 1920), None);
/// ```
pub fn calculate_fit_dimensions(original: (u32, u32), max_dimension: u32) -> Option<(u32, u32)> {
    let (orig_w, orig_h) = original;
    let longer_edge = orig_w.max(orig_h);
    if max_dimension == 0 || longer_edge <= max_dimension {
        return None;
    }

    let ratio = max_dimension as f64 / longer_edge as f64;
    let scale = |edge: u32| ((edge as f64 * ratio).round() as u32).max(1);

    if orig_w >= orig_h {
        // Landscape or square
        Some((max_dimension, scale(orig_h)))
    } else {
        // Portrait
        Some((scale(orig_w), max_dimension))
    }
}
