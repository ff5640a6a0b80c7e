//! Archive-prefix elision and repair.
//!
//! The first segment of a logical path names the archive the texture lives
//! in. A target in the same archive as its source is stored without that
//! segment; at restore time the segment is put back by checking the target's
//! first segment against the set of known archive names.
//!
//! A same-archive target whose own first directory happens to share its name
//! with an archive is indistinguishable from a cross-archive target and is
//! left as-is.

use std::collections::BTreeSet;

use crate::catalog::path_utils::first_segment;

use super::RemapLedger;

/// Strip the shared archive segment from `target`.
///
/// Applies only when both paths have at least two segments and their first
/// segments are equal. Inputs are expected in key form (lower-cased).
///
/// # Examples
///
/// ```
/// use texdupe::ledger::elide_shared_prefix;
///
/// assert_eq!(elide_shared_prefix("arc/tex/b.dds", "arc/tex/a.dds"), "tex/a.dds");
/// assert_eq!(elide_shared_prefix("arc1/b.dds", "arc2/a.dds"), "arc2/a.dds");
/// assert_eq!(elide_shared_prefix("b.dds", "a.dds"), "a.dds");
/// ```
#[must_use]
pub fn elide_shared_prefix(source: &str, target: &str) -> String {
    match (first_segment(source), target.split_once('/')) {
        (Some(source_archive), Some((target_archive, rest))) if source_archive == target_archive => {
            rest.to_string()
        }
        _ => target.to_string(),
    }
}

/// Known archive names for one restore run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveNames {
    names: BTreeSet<String>,
}

impl ArchiveNames {
    /// Collect the first segment of every source in `ledgers`.
    #[must_use]
    pub fn from_ledgers<'a>(ledgers: impl IntoIterator<Item = &'a RemapLedger>) -> Self {
        let mut names = Self::default();
        for ledger in ledgers {
            for entry in ledger.entries() {
                if let Some(archive) = first_segment(entry.source()) {
                    names.insert(archive);
                }
            }
        }
        names
    }

    /// Add one archive name (case-folded).
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_lowercase());
    }

    /// Check whether `name` is a known archive.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    /// Number of known archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no archive is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Extend<String> for ArchiveNames {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for name in iter {
            self.insert(&name);
        }
    }
}

/// Rebuild the full logical path of a stored target.
///
/// A target whose first segment is a known archive is returned unchanged.
/// Otherwise, including single-segment targets, the source's archive segment
/// is prepended when the source has one.
///
/// # Examples
///
/// ```
/// use texdupe::ledger::{qualify_target, ArchiveNames};
///
/// let mut archives = ArchiveNames::default();
/// archives.insert("arc");
///
/// assert_eq!(qualify_target("arc/tex/b.dds", "tex/a.dds", &archives), "arc/tex/a.dds");
/// assert_eq!(qualify_target("arc/b.dds", "a.dds", &archives), "arc/a.dds");
/// assert_eq!(qualify_target("arc/b.dds", "arc/a.dds", &archives), "arc/a.dds");
/// ```
#[must_use]
pub fn qualify_target(source: &str, target: &str, archives: &ArchiveNames) -> String {
    if let Some(archive) = first_segment(target) {
        if archives.contains(archive) {
            return target.to_string();
        }
    }
    match first_segment(source) {
        Some(archive) => format!("{archive}/{target}"),
        None => target.to_string(),
    }
}
