//! Display names derived from file and directory names.
//!
//! Both images and collections get a default label from the filesystem:
//! `kuku-trees.jpg` becomes "Kuku Trees", `street_photos/` becomes
//! "Street Photos". The label is only a starting point; once written to the
//! store it belongs to the user.

/// Turn a file stem or directory name into a readable caption.
///
/// - Every run of characters outside `[A-Za-z0-9]` collapses into one space
/// - Each space-separated word gets an upper-case first character and a
///   lower-case remainder
///
/// Leading and trailing separators are not trimmed, so `_draft` becomes
/// `" Draft"`.
pub fn to_readable_caption(input: &str) -> String {
    let mut spaced = String::with_capacity(input.len());
    let mut prev_separator = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            spaced.push(c);
            prev_separator = false;
        } else {
            if !prev_separator {
                spaced.push(' ');
            }
            prev_separator = true;
        }
    }

    spaced
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Collection ids for an image at `relative_path` (posix, relative to root).
///
/// The parent directory is the only collection; files at the root belong to
/// none.
///
/// - `kuku/kuku-trees.jpg` → `["kuku"]`
/// - `travel/japan/tokyo.jpg` → `["travel/japan"]`
/// - `landscape.jpg` → `[]`
pub fn collection_ids_for(relative_path: &str) -> Vec<String> {
    match parent_dir(relative_path) {
        Some(dir) => vec![dir.to_string()],
        None => Vec::new(),
    }
}

/// Parent directory of a posix relative path, `None` for root-level files.
pub fn parent_dir(relative_path: &str) -> Option<&str> {
    relative_path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .filter(|dir| !dir.is_empty() && *dir != ".")
}

/// File stem of a posix relative path (`kuku/kuku-trees.jpg` → `kuku-trees`).
pub fn file_stem(relative_path: &str) -> &str {
    let name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}
