//! File catalog for the texture set under a scan root.
//!
//! This module provides functionality for:
//! - Recursive, depth-first enumeration of blob files (see [`walker`])
//! - Logical path normalization (see [`path_utils`])
//! - Lazily loaded size, fingerprint and full content per record
//!
//! # Architecture
//!
//! The [`Catalog`] is an arena: records live in a `Vec` and are addressed by
//! index, while a `BTreeMap` keyed by the case-folded logical path gives the
//! deterministic iteration order the detector depends on. The detector
//! mutates records in place through indices, so no shared mutable references
//! are ever needed.
//!
//! # Example
//!
//! ```no_run
//! use texdupe::catalog::{enumerate, WalkerConfig};
//! use std::path::Path;
//!
//! let catalog = enumerate(Path::new("extracted/track"), &WalkerConfig::default()).unwrap();
//! for record in catalog.iter() {
//!     println!("{}", record.logical_path());
//! }
//! ```

pub mod path_utils;
pub mod walker;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub use walker::{Walker, WalkerConfig};

/// Default number of leading bytes kept as a record's fingerprint.
pub const FINGERPRINT_SIZE: usize = 4096;

/// Default blob extension (DirectDraw Surface textures).
pub const DEFAULT_EXTENSION: &str = "dds";

/// Errors that can occur while building or reading the catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    /// The scan root does not exist.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Two enumerated files normalized to the same logical path.
    #[error("Catalog key collision on '{0}'")]
    DuplicateKey(String),

    /// The file changed between the size check and a content read.
    #[error("File changed during scan: {path} (expected {expected} bytes, read {actual})")]
    Changed {
        /// Path of the changed file
        path: PathBuf,
        /// Size recorded for the file
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// Directory traversal failed.
    #[error("Walk failed at {path}: {source}")]
    Walk {
        /// Path where traversal failed
        path: PathBuf,
        /// The underlying walkdir error
        #[source]
        source: walkdir::Error,
    },

    /// An I/O error occurred while reading a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One physical blob file under the scan root.
///
/// Size, fingerprint and content are read from disk on first use and cached.
/// Once the record is marked processed both buffers are dropped and the
/// record never goes back to unprocessed.
#[derive(Debug, Clone)]
pub struct FileRecord {
    logical_path: String,
    path: PathBuf,
    size: Option<u64>,
    fingerprint: Option<Vec<u8>>,
    content: Option<Vec<u8>>,
    processed: bool,
}

impl FileRecord {
    /// Create a record for `path`, known under `logical_path` relative to the root.
    #[must_use]
    pub fn new(logical_path: impl Into<String>, path: PathBuf) -> Self {
        Self {
            logical_path: logical_path.into(),
            path,
            size: None,
            fingerprint: None,
            content: None,
            processed: false,
        }
    }

    /// Path relative to the scan root, `/`-separated.
    #[must_use]
    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    /// Case-folded logical path, the catalog key.
    #[must_use]
    pub fn key(&self) -> String {
        self.logical_path.to_lowercase()
    }

    /// On-disk location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes, read from metadata on first call.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be stat'ed.
    pub fn size(&mut self) -> Result<u64, CatalogError> {
        if let Some(size) = self.size {
            return Ok(size);
        }
        let metadata = fs::metadata(&self.path).map_err(|e| CatalogError::io(&self.path, e))?;
        let size = metadata.len();
        self.size = Some(size);
        Ok(size)
    }

    /// Size if it has already been read.
    #[must_use]
    pub fn cached_size(&self) -> Option<u64> {
        self.size
    }

    /// Load the first `limit` bytes as the fingerprint and return its length.
    ///
    /// Repeated calls return the cached length without touching the file.
    /// The fingerprint length is always `min(limit, size)`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or
    /// [`CatalogError::Changed`] if fewer bytes are available than the size promised.
    pub fn fingerprint_size(&mut self, limit: usize) -> Result<usize, CatalogError> {
        if let Some(ref fingerprint) = self.fingerprint {
            return Ok(fingerprint.len());
        }

        let size = self.size()?;
        let expected = size.min(limit as u64);
        let file = File::open(&self.path).map_err(|e| CatalogError::io(&self.path, e))?;
        let mut buf = Vec::with_capacity(expected as usize);
        file.take(expected)
            .read_to_end(&mut buf)
            .map_err(|e| CatalogError::io(&self.path, e))?;

        if buf.len() as u64 != expected {
            return Err(CatalogError::Changed {
                path: self.path.clone(),
                expected: size,
                actual: buf.len() as u64,
            });
        }

        log::trace!(
            "Fingerprint loaded: {} ({} bytes)",
            self.logical_path,
            buf.len()
        );
        let len = buf.len();
        self.fingerprint = Some(buf);
        Ok(len)
    }

    /// The cached fingerprint, empty if not loaded or already released.
    #[must_use]
    pub fn fingerprint(&self) -> &[u8] {
        self.fingerprint.as_deref().unwrap_or_default()
    }

    /// Load the entire file and return its length.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, or
    /// [`CatalogError::Changed`] if its length no longer matches the recorded size.
    pub fn load_content(&mut self) -> Result<usize, CatalogError> {
        if let Some(ref content) = self.content {
            return Ok(content.len());
        }

        let size = self.size()?;
        let content = fs::read(&self.path).map_err(|e| CatalogError::io(&self.path, e))?;
        if content.len() as u64 != size {
            return Err(CatalogError::Changed {
                path: self.path.clone(),
                expected: size,
                actual: content.len() as u64,
            });
        }

        let len = content.len();
        self.content = Some(content);
        Ok(len)
    }

    /// The cached full content, empty if not loaded or already released.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        self.content.as_deref().unwrap_or_default()
    }

    /// Drop the full-content buffer but keep the fingerprint.
    pub fn release_content(&mut self) {
        self.content = None;
    }

    /// Whether the record has been resolved as survivor or duplicate.
    #[must_use]
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Mark the record processed and release both buffers.
    pub fn mark_processed(&mut self) {
        debug_assert!(
            !self.processed,
            "record {} processed twice",
            self.logical_path
        );
        self.processed = true;
        self.fingerprint = None;
        self.content = None;
    }
}

/// Arena of [`FileRecord`]s keyed by case-folded logical path.
#[derive(Debug, Default)]
pub struct Catalog {
    root: PathBuf,
    records: Vec<FileRecord>,
    index: BTreeMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog for `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            records: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// The scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Add a record, returning its arena index.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateKey`] if another record already
    /// owns the same logical path. This is an internal consistency failure.
    pub fn insert(&mut self, record: FileRecord) -> Result<usize, CatalogError> {
        let key = record.key();
        if self.index.contains_key(&key) {
            log::error!("Catalog key collision: {}", record.logical_path());
            return Err(CatalogError::DuplicateKey(record.logical_path().to_string()));
        }
        let idx = self.records.len();
        self.records.push(record);
        self.index.insert(key, idx);
        Ok(idx)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by logical path (case-insensitive).
    #[must_use]
    pub fn get(&self, logical_path: &str) -> Option<&FileRecord> {
        self.index
            .get(&logical_path.to_lowercase())
            .map(|&idx| &self.records[idx])
    }

    /// Record at arena index `idx`.
    #[must_use]
    pub fn record(&self, idx: usize) -> &FileRecord {
        &self.records[idx]
    }

    /// Mutable record at arena index `idx`.
    pub fn record_mut(&mut self, idx: usize) -> &mut FileRecord {
        &mut self.records[idx]
    }

    /// Borrow two distinct records mutably at once.
    ///
    /// # Panics
    ///
    /// Panics if `a == b` or either index is out of bounds.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> (&mut FileRecord, &mut FileRecord) {
        assert_ne!(a, b, "pair_mut requires two distinct records");
        if a < b {
            let (left, right) = self.records.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.records.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    /// Arena indices in logical path order.
    #[must_use]
    pub fn ordered_indices(&self) -> Vec<usize> {
        self.index.values().copied().collect()
    }

    /// Iterate records in logical path order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> + '_ {
        self.index.values().map(move |&idx| &self.records[idx])
    }
}

/// Enumerate every blob under `root` into a new [`Catalog`].
///
/// # Errors
///
/// Fails if `root` is missing or not a directory, if traversal fails, or
/// if two files normalize to the same logical path.
pub fn enumerate(root: &Path, config: &WalkerConfig) -> Result<Catalog, CatalogError> {
    if !root.exists() {
        return Err(CatalogError::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_path_buf()));
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("catalog", 0);
    }

    let mut catalog = Catalog::new(root);
    for record in Walker::new(root, config.clone()).walk() {
        catalog.insert(record?)?;
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("catalog");
    }

    log::info!(
        "Catalogued {} .{} files under {}",
        catalog.len(),
        config.extension,
        root.display()
    );
    Ok(catalog)
}
