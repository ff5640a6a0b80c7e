//! Restoration of deleted duplicates from remap ledgers.
//!
//! Restore replays ledgers backwards: every deleted source is re-created by
//! copying its surviving target. Because a target may itself have been
//! deleted by another entry (a chain), the resolver repeats passes over the
//! pending entries until nothing is left or a pass makes no progress.
//!
//! - [`resolver`]: the fixed-point loop
//! - [`tree`]: case-insensitive lookup of what is on disk

pub mod resolver;
pub mod tree;

use std::path::PathBuf;

pub use resolver::{restore_from_ledgers, RestoreConfig, RestoreReport, RestoreResolver};
pub use tree::TreeIndex;

/// Errors that abort a restore run.
#[derive(thiserror::Error, Debug)]
pub enum RestoreError {
    /// The root does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Indexing the tree failed.
    #[error("Walk failed at {path}: {source}")]
    Walk {
        /// Path where traversal failed
        path: PathBuf,
        /// The underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// Creating a directory or copying a file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
