//! Case-insensitive view of the tree being restored.
//!
//! Ledger paths are lower-cased while extracted file names may carry any
//! case. The index maps lower-cased logical paths to the real on-disk paths
//! so lookups work on case-sensitive filesystems too.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::RestoreError;
use crate::catalog::path_utils::logical_path;

/// Lower-cased logical path to on-disk path, for files and directories.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    root: PathBuf,
    files: HashMap<String, PathBuf>,
    dirs: HashMap<String, PathBuf>,
}

impl TreeIndex {
    /// Index every file and directory under `root`.
    ///
    /// When two names differ only in case, the first in walk order wins.
    ///
    /// # Errors
    ///
    /// Returns [`RestoreError::Walk`] if traversal fails.
    pub fn scan(root: &Path) -> Result<Self, RestoreError> {
        let mut index = Self {
            root: root.to_path_buf(),
            ..Self::default()
        };

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| RestoreError::Walk {
                path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                source: e,
            })?;
            let Some(logical) = logical_path(root, entry.path()) else {
                log::warn!("Skipping unindexable path: {}", entry.path().display());
                continue;
            };

            let key = logical.to_lowercase();
            let slot = if entry.file_type().is_dir() {
                &mut index.dirs
            } else {
                &mut index.files
            };
            if slot.contains_key(&key) {
                log::debug!("Case-insensitive name clash ignored: {}", logical);
                continue;
            }
            slot.insert(key, entry.into_path());
        }

        log::debug!(
            "Indexed {} files and {} directories under {}",
            index.files.len(),
            index.dirs.len(),
            root.display()
        );
        Ok(index)
    }

    /// The indexed root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk path of the file with logical key `key`.
    #[must_use]
    pub fn file(&self, key: &str) -> Option<&Path> {
        self.files.get(key).map(PathBuf::as_path)
    }

    /// Whether a file with logical key `key` exists.
    #[must_use]
    pub fn contains_file(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    /// Names of the directories directly under the root, lower-cased.
    pub fn top_level_dirs(&self) -> impl Iterator<Item = &str> + '_ {
        self.dirs
            .keys()
            .filter(|key| !key.contains('/'))
            .map(String::as_str)
    }

    /// Where a new file with logical key `key` should be written.
    ///
    /// Existing directories are reused whatever their case; missing ones are
    /// named after the key.
    #[must_use]
    pub fn placement(&self, key: &str) -> PathBuf {
        let segments: Vec<&str> = key.split('/').collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            return self.root.clone();
        };

        let mut path = self.root.clone();
        let mut prefix = String::new();
        for dir in dirs {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(dir);
            match self.dirs.get(&prefix) {
                Some(existing) => path = existing.clone(),
                None => path.push(dir),
            }
        }
        path.push(file_name);
        path
    }

    /// Record a file that was just written, along with its parent directories.
    pub fn record_file(&mut self, key: &str, path: PathBuf) {
        let mut key_prefix = key;
        let mut dir = path.parent();
        while let (Some((parent_key, _)), Some(parent)) = (key_prefix.rsplit_once('/'), dir) {
            self.dirs
                .entry(parent_key.to_string())
                .or_insert_with(|| parent.to_path_buf());
            key_prefix = parent_key;
            dir = parent.parent();
        }
        self.files.insert(key.to_string(), path);
    }

    /// Number of indexed files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}
