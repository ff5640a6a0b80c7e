//! Logical path normalization.
//!
//! Every path the core compares or persists goes through these helpers so
//! that the catalog, the ledger and the restore resolver agree on one form:
//! `/`-separated, relative, NFC-normalized, no `.` segments, no empty
//! segments.
//!
//! # Example
//!
//! ```
//! use texdupe::catalog::path_utils::normalize_separators;
//!
//! assert_eq!(normalize_separators(".\\tex\\\\a.dds"), "tex/a.dds");
//! ```

use std::path::{Component, Path};
use unicode_normalization::UnicodeNormalization;

/// Normalize a textual path to the logical form.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and the
/// result is NFC-normalized. Case is preserved.
#[must_use]
pub fn normalize_separators(s: &str) -> String {
    let joined = s
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");
    joined.as_str().nfc().collect()
}

/// Build the logical path of `path` relative to `root`.
///
/// Returns `None` if `path` is not under `root` or a component is not
/// valid UTF-8.
#[must_use]
pub fn logical_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/").as_str().nfc().collect())
}

/// Case-folded key used to compare logical paths.
#[must_use]
pub fn path_key(logical: &str) -> String {
    normalize_separators(logical).to_lowercase()
}

/// Check whether `path` carries `extension` (case-insensitive, leading dot optional).
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}

/// First `/`-separated segment of a logical path, if the path has more than one.
///
/// A single-segment path names a file directly under the root and has no
/// archive segment.
#[must_use]
pub fn first_segment(logical: &str) -> Option<&str> {
    logical.split_once('/').map(|(head, _)| head)
}

/// Join logical segments onto an on-disk root.
#[must_use]
pub fn to_fs_path(root: &Path, logical: &str) -> std::path::PathBuf {
    let mut path = root.to_path_buf();
    for segment in logical.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}
