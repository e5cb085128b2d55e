//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. The primary display
//! for every entity (collection, image) is its semantic identity: positional
//! index and title. Paths, ids and camera data follow as indented context
//! lines, so the output reads as a content inventory while still letting
//! users trace entries back to files.
//!
//! # Entity Display Contract
//!
//! 1. **Header line**: positional index + title (+ optional photo count)
//! 2. **Context lines**: indented `Id:`, `Source:`, `Camera:` and so on
//!
//! Shared helpers ([`entity_header`], [`image_line`]) keep `generate`,
//! `images` and `collections` consistent for the same entities.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Batch 1/1 (4 images)
//!     001 kuku/kuku-bubble.jpg
//!         optimized 48x64 → 24x32
//!     ...
//!
//! Collections
//! 001 Kuku (2 photos)
//!     Id: kuku
//! 002 Popo (1 photos)
//!     Id: popo
//!
//! Images: 4 added, 0 refreshed, 0 evicted
//! Collections: 2 added, 0 evicted
//! Optimization: 3 optimized, 1 within bounds (4 total)
//! Store: gallery/gallery.yaml
//! ```
//!
//! ## Images
//!
//! ```text
//! 001 Kuku Trees
//!     Source: /src/gallery/kuku/kuku-trees.jpg (64x48 jpg)
//!     Collections: kuku, featured
//!     Captured: 2025-02-21 09:17:14 UTC
//!     Camera: LEICA Q3, SUMMILUX 1:1.7/28 ASPH., 28mm f/8 1/640s ISO 100
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use serde::Serialize;
use std::path::Path;

use crate::generate::GenerateReport;
use crate::process::{ImageStatus, ProcessEvent};
use crate::query::{Image, ProcessedExif};
use crate::types::Collection;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional detail.
///
/// ```text
/// 001 Kuku (5 photos)
/// 001 Kuku
/// ```
fn entity_header(index: usize, title: &str, count: Option<usize>) -> String {
    match count {
        Some(n) => format!("{} {} ({} photos)", format_index(index), title, n),
        None => format!("{} {}", format_index(index), title),
    }
}

/// Format an image line: titled images show title, untitled show filename in parens.
///
/// ```text
/// 001 Kuku Trees        // titled
/// 001 (kuku-trees.jpg)  // untitled, the filename is the identity
/// ```
fn image_line(index: usize, title: Option<&str>, filename: &str) -> String {
    match title {
        Some(t) if !t.trim().is_empty() => format!("{} {}", format_index(index), t),
        _ => format!("{} ({})", format_index(index), filename),
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn status_line(status: &ImageStatus) -> String {
    match status {
        ImageStatus::Optimized { from, to } => {
            format!("optimized {}x{} \u{2192} {}x{}", from.0, from.1, to.0, to.1)
        }
        ImageStatus::Cached => "cached".to_string(),
        ImageStatus::WithinBounds => "within bounds".to_string(),
        ImageStatus::Skipped => "metadata only".to_string(),
        ImageStatus::Failed(reason) => format!("failed: {}", reason),
    }
}

/// One-line camera summary, or `None` when there is nothing to show.
///
/// ```text
/// LEICA Q3, SUMMILUX 1:1.7/28 ASPH., 28mm f/8 1/640s ISO 100
/// ```
fn camera_summary(exif: &ProcessedExif) -> Option<String> {
    let mut settings = Vec::new();
    if let Some(focal) = exif.focal_length {
        settings.push(format!("{}mm", focal));
    }
    if let Some(f) = exif.f_number {
        settings.push(format!("f/{}", f));
    }
    if let Some(speed) = exif.shutter_speed {
        settings.push(if speed >= 1.0 {
            format!("1/{}s", speed.round())
        } else {
            format!("{}s", 1.0 / speed)
        });
    }
    if let Some(iso) = exif.iso {
        settings.push(format!("ISO {}", iso));
    }

    let mut parts: Vec<String> = [&exif.model, &exif.lens_model]
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if !settings.is_empty() {
        parts.push(settings.join(" "));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

// ============================================================================
// generate
// ============================================================================

/// Format a single processing progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted {
            batch,
            batches,
            size,
        } => vec![format!("Batch {}/{} ({} images)", batch, batches, size)],
        ProcessEvent::ImageProcessed {
            index, path, status, ..
        } => vec![
            format!("{}{} {}", indent(1), format_index(*index), path),
            format!("{}{}", indent(2), status_line(status)),
        ],
    }
}

/// Format the result of a `generate` run.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.data.collections.is_empty() {
        lines.push("Collections".to_string());
        for (i, collection) in report.data.collections.iter().enumerate() {
            let count = report
                .data
                .images
                .iter()
                .filter(|image| image.meta.collections.contains(&collection.id))
                .count();
            lines.push(entity_header(i + 1, &collection.name, Some(count)));
            lines.push(format!("{}Id: {}", indent(1), collection.id));
        }
        lines.push(String::new());
    }

    let summary = &report.summary;
    lines.push(format!(
        "Images: {} added, {} refreshed, {} evicted",
        summary.images_added, summary.images_refreshed, summary.images_evicted
    ));
    lines.push(format!(
        "Collections: {} added, {} evicted",
        summary.collections_added, summary.collections_evicted
    ));
    if report.cache_stats.total() > 0 {
        lines.push(format!("Optimization: {}", report.cache_stats));
    }

    let failed: Vec<_> = report
        .images
        .iter()
        .filter_map(|image| match &image.status {
            ImageStatus::Failed(reason) => Some((image.relative.as_str(), reason)),
            _ => None,
        })
        .collect();
    if !failed.is_empty() {
        lines.push("Failed".to_string());
        for (path, reason) in failed {
            lines.push(format!("{}{}: {}", indent(1), path, reason));
        }
    }

    lines.push(format!("Store: {}", report.store_path.display()));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// images / collections
// ============================================================================

/// Format resolved images, one entity block per image.
pub fn format_images(images: &[Image]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, image) in images.iter().enumerate() {
        lines.push(image_line(i + 1, Some(&image.title), &file_name(&image.src.src)));
        lines.push(format!(
            "{}Source: {} ({}x{} {})",
            indent(1),
            image.src.src,
            image.src.width,
            image.src.height,
            image.src.format
        ));
        if !image.description.is_empty() {
            lines.push(format!("{}Description: {}", indent(1), image.description));
        }
        if !image.collections.is_empty() {
            lines.push(format!(
                "{}Collections: {}",
                indent(1),
                image.collections.join(", ")
            ));
        }
        if let Some(film) = &image.film_type {
            lines.push(format!("{}Film: {}", indent(1), film));
        }
        if let Some(exif) = &image.exif {
            if let Some(date) = exif.capture_date {
                lines.push(format!(
                    "{}Captured: {}",
                    indent(1),
                    date.format("%Y-%m-%d %H:%M:%S UTC")
                ));
            }
            if let Some(camera) = camera_summary(exif) {
                lines.push(format!("{}Camera: {}", indent(1), camera));
            }
        }
    }
    lines.push(format!("{} images", images.len()));
    lines
}

/// Print images to stdout.
pub fn print_images(images: &[Image]) {
    for line in format_images(images) {
        println!("{}", line);
    }
}

/// Format collections in store order.
pub fn format_collections(collections: &[Collection]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, collection) in collections.iter().enumerate() {
        lines.push(entity_header(i + 1, &collection.name, None));
        lines.push(format!("{}Id: {}", indent(1), collection.id));
    }
    lines.push(format!("{} collections", collections.len()));
    lines
}

/// Print collections to stdout.
pub fn print_collections(collections: &[Collection]) {
    for line in format_collections(collections) {
        println!("{}", line);
    }
}

/// Print any serializable value as pretty JSON to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
