//! Target-path normalization.
//!
//! The target repository rejects some characters in file names and a wider
//! set in folder names. Each forbidden character becomes `_`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters replaced in file names.
pub const FORBIDDEN_IN_NAMES: &[char] = &[':', '*', '?', '"', '<', '>', '|', ';', '#'];

/// Characters replaced in folder names: the file-name set plus a few more.
pub const FORBIDDEN_IN_FOLDERS: &[char] = &[
    ':', '*', '?', '"', '<', '>', '|', ';', '#', '\'', '(', ')', ',', '[', ']', '&', '+',
];

const ORIGINAL_DIR: &str = "original/";

static THUMBNAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*thumbnails/.*_small\.(png|jpg|tiff)$").expect("thumbnail pattern is valid")
});

/// Outcome of normalizing one source path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub expected_path: String,
    /// Forbidden characters were replaced.
    pub transformed: bool,
    /// A leading `original/` segment was stripped.
    pub removed_original_directory: bool,
    /// The source path is a generated thumbnail.
    pub removed_thumbnail: bool,
}

/// Map a source path to its target path.
///
/// The last segment is the file name, everything before it the folder.
/// Returns the target path and whether it differs from the input.
pub fn dv_path(path: &str) -> (String, bool) {
    let (folder, name) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    };
    let mut expected = replace_forbidden(folder, FORBIDDEN_IN_FOLDERS);
    expected.push_str(&replace_forbidden(name, FORBIDDEN_IN_NAMES));
    let transformed = expected != path;
    (expected, transformed)
}

/// Whether `path` (matched case-insensitively) is a generated thumbnail.
pub fn is_thumbnail(path: &str) -> bool {
    THUMBNAIL.is_match(&path.to_lowercase())
}

/// Normalize a source path, optionally stripping a leading `original/` segment first.
///
/// Thumbnail detection looks at `path` as given. `transformed` compares against
/// the path after stripping, so stripping alone does not count as a transformation.
pub fn normalize(path: &str, strip_original: bool) -> NormalizedPath {
    let stripped = if strip_original {
        path.strip_prefix(ORIGINAL_DIR)
    } else {
        None
    };
    let source = stripped.unwrap_or(path);
    let (expected_path, transformed) = dv_path(source);
    NormalizedPath {
        expected_path,
        transformed,
        removed_original_directory: stripped.is_some(),
        removed_thumbnail: is_thumbnail(path),
    }
}

fn replace_forbidden(segment: &str, forbidden: &[char]) -> String {
    segment
        .chars()
        .map(|c| if forbidden.contains(&c) { '_' } else { c })
        .collect()
}
