//! # photofolio
//!
//! The metadata back end of a static photography portfolio. Your filesystem
//! is the data source: directories become collections, file names become
//! captions, and camera data comes from EXIF. Everything lands in a single
//! human-editable YAML file, the **store**, which the site reads at build
//! time.
//!
//! # Architecture: Generate, Then Query
//!
//! ```text
//! generate   gallery/  →  gallery.yaml   (scan, EXIF, optimize, reconcile, save)
//! query      gallery.yaml + assets  →  [Image]   (validate, filter, sort, join)
//! ```
//!
//! The two halves share nothing but the store file. `generate` is run by the
//! photographer whenever images change; the query layer is called by the
//! presentation layer on every site build and never writes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generate`] | Pipeline orchestration: scan → process → reconcile → save |
//! | [`scan`] | Walks the gallery root for images and directory-derived collection ids |
//! | [`process`] | Per-file EXIF extraction and in-place optimization, batched on rayon |
//! | [`cache`] | Content-hash cache of optimized files (and the EXIF they used to carry) |
//! | [`entity`] | Builds store entries from files: captions, collections, cleaned EXIF |
//! | [`reconcile`] | Merges a fresh scan into the persisted store |
//! | [`store`] | `gallery.yaml` load/save with atomic replace |
//! | [`query`] | Read path: `get_images`, `get_collections`, store validation |
//! | [`assets`] | Decoded image assets keyed by normalized path |
//! | [`config`] | `config.toml` loading, validation, and merging |
//! | [`types`] | The persisted data model |
//! | [`naming`] | Caption and collection-id derivation from paths |
//! | [`imaging`] | Pure-Rust image operations: identify, EXIF, resize |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Two Owners, One File
//!
//! The store is written by the tool and edited by hand. Each field has one
//! owner: the photographer owns titles, descriptions, collection membership
//! and collection names; the tool owns EXIF and which entries exist. The
//! [`reconcile`] module encodes this split, which is what makes re-running
//! `generate` safe after any amount of hand editing.
//!
//! ## Validate on Read
//!
//! Hand edits can reference collections that do not exist. The store is not
//! validated when written but every time it is read: [`query`] refuses to
//! serve a store with dangling collection ids, so a typo breaks the site
//! build loudly instead of silently hiding an image.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding and Lanczos3
//! resampling and `kamadak-exif` for metadata. No ImageMagick, no system
//! libraries: the binary is self-contained.

pub mod assets;
pub mod cache;
pub mod config;
pub mod entity;
pub mod generate;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod process;
pub mod query;
pub mod reconcile;
pub mod scan;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
