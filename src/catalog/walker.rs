//! Sequential directory walker for blob discovery.
//!
//! # Overview
//!
//! The [`Walker`] traverses the scan root depth-first with `walkdir`,
//! sorting each directory's entries by name so that enumeration order is
//! reproducible across platforms. Only regular files carrying the configured
//! extension and living inside an archive directory are yielded; files
//! directly under the root have no archive segment and are invisible to the
//! core, as is everything else.
//!
//! # Example
//!
//! ```no_run
//! use texdupe::catalog::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("extracted/track"), WalkerConfig::default());
//! for record in walker.walk() {
//!     match record {
//!         Ok(record) => println!("{}", record.logical_path()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use super::path_utils::{first_segment, has_extension, logical_path};
use super::{CatalogError, FileRecord, DEFAULT_EXTENSION};
use crate::progress::ProgressCallback;

/// Configuration for directory walking.
#[derive(Clone)]
pub struct WalkerConfig {
    /// Extension of the blob files to catalogue (without the dot).
    pub extension: String,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for WalkerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkerConfig")
            .field("extension", &self.extension)
            .field("follow_symlinks", &self.follow_symlinks)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            follow_symlinks: false,
            progress_callback: None,
        }
    }
}

impl WalkerConfig {
    /// Set the blob extension.
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Depth-first walker yielding one [`FileRecord`] per blob.
#[derive(Debug)]
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for `root`.
    #[must_use]
    pub fn new(root: &Path, config: WalkerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Walk the tree.
    ///
    /// Traversal errors are yielded as [`CatalogError::Walk`]; the caller
    /// decides whether to stop.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, CatalogError>> + '_ {
        let mut seen = 0usize;
        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        let path = e
                            .path()
                            .map_or_else(|| self.root.clone(), Path::to_path_buf);
                        log::error!("Walk failed at {}: {}", path.display(), e);
                        return Some(Err(CatalogError::Walk { path, source: e }));
                    }
                };

                if !entry.file_type().is_file() {
                    return None;
                }
                if !has_extension(entry.path(), &self.config.extension) {
                    log::trace!("Skipping non-blob file: {}", entry.path().display());
                    return None;
                }

                let Some(logical) = logical_path(&self.root, entry.path()) else {
                    log::warn!(
                        "Skipping file with non UTF-8 name: {}",
                        entry.path().display()
                    );
                    return None;
                };

                if first_segment(&logical).is_none() {
                    log::debug!("Skipping file outside any archive: {}", logical);
                    return None;
                }

                seen += 1;
                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(seen, &logical);
                }

                Some(Ok(FileRecord::new(logical, entry.into_path())))
            })
    }
}
