//! Verified permanent deletion of confirmed duplicates.
//!
//! # Overview
//!
//! A duplicate is only removed after its current size matches the size seen
//! while it was compared, and the removal only counts once the path is gone.
//! Every failure is returned to the caller, which aborts the run: a ledger
//! entry must never exist for a file that is still on disk.
//!
//! # Example
//!
//! ```no_run
//! use texdupe::actions::delete::remove_duplicate;
//! use std::path::Path;
//!
//! match remove_duplicate(Path::new("track/tex/b.dds"), 4096) {
//!     Ok(result) => println!("Removed {} ({} bytes)", result.path.display(), result.size),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File size changed since it was compared.
    #[error("file modified since comparison: {path} (expected {expected} bytes, found {actual})")]
    Modified {
        /// Path of the modified file
        path: PathBuf,
        /// Size seen during comparison
        expected: u64,
        /// Size found just before deletion
        actual: u64,
    },

    /// `remove_file` reported success but the path still exists.
    #[error("file still present after delete: {0}")]
    StillPresent(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::StillPresent(p)
            | Self::Modified { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
}

/// File metadata snapshot taken right before deletion.
#[derive(Debug, Clone)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl FileSnapshot {
    /// Capture a file's current state.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or can't be accessed.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Check that the file still has the size seen during comparison.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteError::Modified`] on a size mismatch.
    pub fn verify_size(&self, expected: u64) -> Result<(), DeleteError> {
        if self.size != expected {
            log::warn!(
                "File modified since comparison: {} (size changed from {} to {})",
                self.path.display(),
                expected,
                self.size
            );
            return Err(DeleteError::Modified {
                path: self.path.clone(),
                expected,
                actual: self.size,
            });
        }
        Ok(())
    }
}

/// Permanently remove a confirmed duplicate.
///
/// **WARNING**: This operation cannot be undone. The only way back is the
/// remap ledger and a restore run.
///
/// # Errors
///
/// - `NotFound` / `PermissionDenied` / `Io` if the file cannot be accessed or removed
/// - `Modified` if its size differs from `expected_size`
/// - `StillPresent` if the path exists after removal
pub fn remove_duplicate(path: &Path, expected_size: u64) -> Result<DeleteResult, DeleteError> {
    let snapshot = FileSnapshot::capture(path)?;
    snapshot.verify_size(expected_size)?;

    fs::remove_file(path).map_err(|e| {
        log::error!("Delete failed for {}: {}", path.display(), e);
        DeleteError::from_io(path, e)
    })?;

    match fs::symlink_metadata(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Ok(_) => {
            log::error!("Delete did not take effect: {}", path.display());
            return Err(DeleteError::StillPresent(path.to_path_buf()));
        }
        Err(e) => return Err(DeleteError::from_io(path, e)),
    }

    log::debug!("Deleted: {} ({} bytes)", path.display(), snapshot.size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size: snapshot.size,
    })
}
