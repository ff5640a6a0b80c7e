//! Remap ledger: which deleted paths collapse onto which surviving paths.
//!
//! # Overview
//!
//! A ledger is an ordered list of [`RemapEntry`] values for one logical
//! group (one track's texture set). Each entry names a `source` that was
//! deleted and a `target` that survives and must be substituted at load time.
//!
//! - [`remap`]: archive-prefix elision when building, and repair when restoring
//! - [`builder`]: accumulation with source uniqueness enforced
//! - [`io`]: the tab-separated text form
//!
//! # Path form
//!
//! Paths are stored relative to the group root, `/`-separated and lower-cased.
//! The first segment is the archive name. When source and target live in the
//! same archive, the target omits that segment.
//!
//! # Example
//!
//! ```
//! use texdupe::ledger::RemapEntry;
//!
//! let entry = RemapEntry::from_logical("track/tex/B.dds", "track/tex/a.dds").unwrap();
//! assert_eq!(entry.source(), "track/tex/b.dds");
//! assert_eq!(entry.target(), "tex/a.dds");
//! ```

pub mod builder;
pub mod io;
pub mod remap;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::catalog::path_utils::path_key;

pub use builder::LedgerBuilder;
pub use io::{parse_ledger, read_ledger, render_ledger, write_ledger};
pub use remap::{elide_shared_prefix, qualify_target, ArchiveNames};

/// Lines starting with this character are comments.
pub const COMMENT_MARKER: char = ';';

/// Separator between the two fields of a data line.
pub const FIELD_SEPARATOR: char = '\t';

/// Errors raised while building, reading or writing a ledger.
#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    /// A source path was inserted twice.
    #[error("Duplicate ledger source '{0}'")]
    DuplicateSource(String),

    /// An entry would map a path onto itself.
    #[error("Ledger entry maps '{0}' onto itself")]
    SelfMapping(String),

    /// An entry has an empty field.
    #[error("Ledger entry has an empty path")]
    EmptyPath,

    /// Reading or writing the ledger file failed.
    #[error("I/O error for ledger {path}: {source}")]
    Io {
        /// Ledger file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One ledger line: `source` was deleted, `target` survives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RemapEntry {
    source: String,
    target: String,
}

impl RemapEntry {
    /// Create an entry from already-stored paths.
    ///
    /// Both paths are normalized and lower-cased; no prefix elision is applied.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EmptyPath`] if either path is empty, or
    /// [`LedgerError::SelfMapping`] if they are equal.
    pub fn new(source: &str, target: &str) -> Result<Self, LedgerError> {
        let source = path_key(source);
        let target = path_key(target);
        if source.is_empty() || target.is_empty() {
            return Err(LedgerError::EmptyPath);
        }
        if source == target {
            return Err(LedgerError::SelfMapping(source));
        }
        Ok(Self { source, target })
    }

    /// Create an entry from two catalog logical paths, eliding the target's
    /// archive segment when both share it.
    ///
    /// # Errors
    ///
    /// Same as [`RemapEntry::new`], checked before elision.
    pub fn from_logical(source: &str, target: &str) -> Result<Self, LedgerError> {
        let full = Self::new(source, target)?;
        let target = elide_shared_prefix(&full.source, &full.target);
        Ok(Self {
            source: full.source,
            target,
        })
    }

    /// The deleted path.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The surviving path, as stored.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Render as a ledger data line (without line terminator).
    #[must_use]
    pub fn to_line(&self) -> String {
        format!("{}{}{}", self.source, FIELD_SEPARATOR, self.target)
    }
}

impl std::fmt::Display for RemapEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Ordered ledger for one logical group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemapLedger {
    entries: Vec<RemapEntry>,
}

impl RemapLedger {
    /// Create a ledger from entries in their existing order.
    #[must_use]
    pub fn from_entries(entries: Vec<RemapEntry>) -> Self {
        Self { entries }
    }

    /// Entries in insertion (or on-file) order.
    #[must_use]
    pub fn entries(&self) -> &[RemapEntry] {
        &self.entries
    }

    /// Consume the ledger, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<RemapEntry> {
        self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by source, the persisted order.
    #[must_use]
    pub fn sorted_entries(&self) -> Vec<RemapEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort();
        sorted
    }

    /// Links where an entry's repaired target is itself deleted by another entry.
    ///
    /// Each pair is `(entry, entry whose source is that target)`. A non-empty
    /// result means the ledger can only be restored in dependency order.
    #[must_use]
    pub fn chains(&self, archives: &ArchiveNames) -> Vec<(&RemapEntry, &RemapEntry)> {
        let by_source: HashMap<&str, &RemapEntry> = self
            .entries
            .iter()
            .map(|entry| (entry.source(), entry))
            .collect();

        self.entries
            .iter()
            .filter_map(|entry| {
                let target = qualify_target(entry.source(), entry.target(), archives);
                by_source
                    .get(target.as_str())
                    .map(|&next| (entry, next))
            })
            .collect()
    }
}
