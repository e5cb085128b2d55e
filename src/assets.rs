//! Decoded image assets and the index the query layer joins against.
//!
//! The presentation layer serves images through its own asset pipeline. The
//! query layer only needs to know, for each store entry, which asset it maps
//! to and that asset's dimensions. Both sides meet on an **asset key**: the
//! normalized, `/`-rooted posix form of the file's path.
//!
//! ```text
//! src/gallery/gallery.yaml    + kuku/kuku-trees.jpg
//!   → /src/gallery/kuku/kuku-trees.jpg
//! ./src/gallery/../gallery/kuku/kuku-trees.jpg
//!   → /src/gallery/kuku/kuku-trees.jpg
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::imaging::ImageBackend;

/// Extensions the asset index picks up.
pub const ASSET_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A decoded image ready to hand to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Asset key of the file.
    pub src: String,
    pub width: u32,
    pub height: u32,
    /// Lower-case file extension (`jpg`, `png`, ...).
    pub format: String,
}

/// Anything that can resolve an asset key.
pub trait AssetSource {
    fn resolve(&self, key: &str) -> Option<&Asset>;
}

/// In-memory asset map keyed by asset key.
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    assets: HashMap<String, Asset>,
}

impl AssetIndex {
    /// Index every image file under `dir`, reading dimensions via `backend`.
    ///
    /// Files that cannot be identified are skipped with a warning. Hidden
    /// files and directories are ignored.
    pub fn build(backend: &impl ImageBackend, dir: &Path) -> Self {
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        let mut assets = HashMap::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable asset entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let Some(format) = asset_format(path) else {
                continue;
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match backend.identify(path) {
                Ok(dims) => {
                    let src = asset_key(path);
                    debug!("Indexed asset {} ({}x{})", src, dims.width, dims.height);
                    assets.insert(
                        src.clone(),
                        Asset {
                            src,
                            width: dims.width,
                            height: dims.height,
                            format,
                        },
                    );
                }
                Err(e) => warn!("Skipping asset {}: {}", path.display(), e),
            }
        }
        Self { assets }
    }

    /// Build an index from already-known assets, keyed by their `src`.
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        Self {
            assets: assets.into_iter().map(|a| (a.src.clone(), a)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetSource for AssetIndex {
    fn resolve(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }
}

/// Normalize `path` into an asset key.
///
/// `.` components are dropped, `..` pops the previous component (never above
/// the root), and any root or drive prefix is discarded before the key is
/// re-rooted at `/`.
pub fn asset_key(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    format!("/{}", parts.join("/"))
}

fn asset_format(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    ASSET_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::test_helpers::{write_test_jpeg, write_test_png};
    use tempfile::TempDir;

    #[test]
    fn asset_key_roots_relative_paths() {
        assert_eq!(
            asset_key(Path::new("src/gallery/kuku/a.jpg")),
            "/src/gallery/kuku/a.jpg"
        );
    }

    #[test]
    fn asset_key_normalizes_dots() {
        assert_eq!(
            asset_key(Path::new("./src/gallery/../gallery/./kuku/a.jpg")),
            "/src/gallery/kuku/a.jpg"
        );
    }

    #[test]
    fn asset_key_keeps_absolute_paths() {
        assert_eq!(asset_key(Path::new("/srv/site/a.jpg")), "/srv/site/a.jpg");
    }

    #[test]
    fn asset_key_cannot_escape_root() {
        assert_eq!(asset_key(Path::new("../../a.jpg")), "/a.jpg");
    }

    #[test]
    fn store_relative_and_walked_paths_agree() {
        let store = Path::new("src/gallery/gallery.yaml");
        let joined = store.parent().unwrap().join("kuku/kuku-trees.jpg");
        let walked = Path::new("src").join("gallery").join("kuku").join("kuku-trees.jpg");
        assert_eq!(asset_key(&joined), asset_key(&walked));
    }

    #[test]
    fn build_indexes_images_with_dimensions() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("kuku")).unwrap();
        write_test_jpeg(&tmp.path().join("kuku/a.jpg"), 30, 20);
        write_test_png(&tmp.path().join("b.PNG"), 10, 40);
        std::fs::write(tmp.path().join("gallery.yaml"), "images: []").unwrap();

        let index = AssetIndex::build(&RustBackend::new(), tmp.path());
        assert_eq!(index.len(), 2);

        let a = index
            .resolve(&asset_key(&tmp.path().join("kuku/a.jpg")))
            .unwrap();
        assert_eq!((a.width, a.height), (30, 20));
        assert_eq!(a.format, "jpg");

        let b = index.resolve(&asset_key(&tmp.path().join("b.PNG"))).unwrap();
        assert_eq!(b.format, "png");
    }

    #[test]
    fn build_skips_undecodable_and_hidden_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.jpg"), b"nope").unwrap();
        write_test_jpeg(&tmp.path().join(".hidden.jpg"), 8, 8);
        write_test_jpeg(&tmp.path().join("ok.jpg"), 8, 8);

        let index = AssetIndex::build(&RustBackend::new(), tmp.path());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn build_on_missing_dir_is_empty() {
        let index = AssetIndex::build(&RustBackend::new(), Path::new("/nonexistent/assets"));
        assert!(index.is_empty());
    }

    #[test]
    fn from_assets_keys_by_src() {
        let index = AssetIndex::from_assets([Asset {
            src: "/g/a.jpg".into(),
            width: 1,
            height: 2,
            format: "jpg".into(),
        }]);
        assert_eq!(index.resolve("/g/a.jpg").unwrap().height, 2);
        assert!(index.resolve("/g/b.jpg").is_none());
    }
}
