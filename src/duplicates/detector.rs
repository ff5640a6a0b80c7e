//! Sequential anchor-based duplicate resolution.
//!
//! # Algorithm
//!
//! Records are visited in logical path order. The first unprocessed record
//! of a size is the *anchor* and survives. Every later unprocessed record of
//! the same size is compared against it byte for byte (fingerprint first,
//! then the remaining content); each identical one is deleted, recorded in
//! the ledger as `candidate -> anchor`, and marked processed. The anchor is
//! then marked processed as well.
//!
//! Records smaller than the size threshold are never compared and never
//! touched. The worst case is quadratic in the size of one same-size bucket,
//! which stays small for texture sets.
//!
//! Any read or delete failure aborts the run. Entries already inserted into
//! the caller's [`LedgerBuilder`] all correspond to files that are gone, so
//! the caller can still persist them.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use serde::Serialize;

use super::compare::{compare_records, Verdict, HEADER_WINDOW};
use super::groups::{group_by_size, DuplicateGroup, SizeBuckets};
use crate::actions::delete::{remove_duplicate, DeleteError};
use crate::catalog::{enumerate, Catalog, CatalogError, WalkerConfig, FINGERPRINT_SIZE};
use crate::ledger::{LedgerBuilder, LedgerError, RemapEntry};
use crate::progress::ProgressCallback;

/// Files below this size are never deduplicated.
pub const MIN_DEDUPE_SIZE: u64 = 1024;

/// Errors that abort duplicate detection.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    /// Enumeration or reading a record failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Deleting a confirmed duplicate failed.
    #[error(transparent)]
    Delete(#[from] DeleteError),

    /// The ledger rejected an entry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Configuration for the duplicate detector.
#[derive(Clone)]
pub struct DetectorConfig {
    /// Records smaller than this are skipped.
    pub min_dedupe_size: u64,
    /// Leading bytes compared before any full read.
    pub fingerprint_size: usize,
    /// Leading fingerprint bytes checked last.
    pub header_window: usize,
    /// Compare and report, but delete nothing.
    pub dry_run: bool,
    /// Enumeration settings used by [`DuplicateDetector::run`].
    pub walker_config: WalkerConfig,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DetectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorConfig")
            .field("min_dedupe_size", &self.min_dedupe_size)
            .field("fingerprint_size", &self.fingerprint_size)
            .field("header_window", &self.header_window)
            .field("dry_run", &self.dry_run)
            .field("walker_config", &self.walker_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_dedupe_size: MIN_DEDUPE_SIZE,
            fingerprint_size: FINGERPRINT_SIZE,
            header_window: HEADER_WINDOW,
            dry_run: false,
            walker_config: WalkerConfig::default(),
            progress_callback: None,
        }
    }
}

impl DetectorConfig {
    /// Set the minimum size considered for deduplication.
    #[must_use]
    pub fn with_min_dedupe_size(mut self, size: u64) -> Self {
        self.min_dedupe_size = size;
        self
    }

    /// Set the fingerprint length.
    #[must_use]
    pub fn with_fingerprint_size(mut self, size: usize) -> Self {
        self.fingerprint_size = size;
        self
    }

    /// Set the header window checked last.
    #[must_use]
    pub fn with_header_window(mut self, window: usize) -> Self {
        self.header_window = window;
        self
    }

    /// Enable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the enumeration settings.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the progress callback, shared with enumeration.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.walker_config = self
            .walker_config
            .with_progress_callback(Arc::clone(&callback));
        self.progress_callback = Some(callback);
        self
    }
}

/// Counters collected during one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectStats {
    /// Records in the catalog
    pub records: usize,
    /// Total size of all records in bytes
    pub total_size: u64,
    /// Records below the size threshold
    pub skipped_small: usize,
    /// Records that shared their size with another
    pub candidates: usize,
    /// Anchor/candidate comparisons performed
    pub comparisons: usize,
    /// Comparisons rejected on the fingerprint
    pub fingerprint_rejections: usize,
    /// Comparisons rejected past the fingerprint
    pub content_rejections: usize,
    /// Records removed as duplicates
    pub duplicates: usize,
    /// Bytes freed by the removals
    pub bytes_reclaimed: u64,
    /// Wall time of the run
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl DetectStats {
    /// Reclaimed space as a human-readable string.
    #[must_use]
    pub fn reclaimed_display(&self) -> String {
        ByteSize::b(self.bytes_reclaimed).to_string()
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Outcome of a detection run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectReport {
    /// Number of records collapsed onto a survivor
    pub count: usize,
    /// Entries produced by this run, in resolution order
    pub entries: Vec<RemapEntry>,
    /// One group per anchor that absorbed at least one duplicate
    pub groups: Vec<DuplicateGroup>,
    /// Whether files were left in place
    pub dry_run: bool,
    /// Run counters
    pub stats: DetectStats,
}

/// Sequential duplicate detector.
///
/// # Example
///
/// ```no_run
/// use texdupe::duplicates::{DetectorConfig, DuplicateDetector};
/// use texdupe::ledger::LedgerBuilder;
/// use std::path::Path;
///
/// let detector = DuplicateDetector::new(DetectorConfig::default().with_dry_run(true));
/// let mut ledger = LedgerBuilder::new();
/// let report = detector.run(Path::new("extracted/track"), &mut ledger).unwrap();
///
/// println!("{} duplicates, {} reclaimable", report.count, report.stats.reclaimed_display());
/// ```
#[derive(Debug)]
pub struct DuplicateDetector {
    config: DetectorConfig,
}

impl DuplicateDetector {
    /// Create a detector with the given configuration.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// The detector's configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Enumerate `root` and resolve every duplicate in it.
    ///
    /// # Errors
    ///
    /// See [`DuplicateDetector::detect`]; enumeration errors are returned as
    /// [`DetectError::Catalog`].
    pub fn run(&self, root: &Path, ledger: &mut LedgerBuilder) -> Result<DetectReport, DetectError> {
        log::info!("Starting duplicate detection in {}", root.display());
        let mut catalog = enumerate(root, &self.config.walker_config)?;
        self.detect(&mut catalog, ledger)
    }

    /// Resolve every duplicate in an already enumerated catalog.
    ///
    /// New entries are appended to `ledger` as each duplicate is removed.
    ///
    /// # Errors
    ///
    /// Returns the first read, delete or ledger failure. Nothing after the
    /// failing record is processed.
    pub fn detect(
        &self,
        catalog: &mut Catalog,
        ledger: &mut LedgerBuilder,
    ) -> Result<DetectReport, DetectError> {
        let start = Instant::now();
        let (buckets, grouping) = group_by_size(catalog, self.config.min_dedupe_size)?;

        let mut report = DetectReport {
            dry_run: self.config.dry_run,
            stats: DetectStats {
                records: grouping.total_files,
                total_size: grouping.total_size,
                skipped_small: grouping.below_threshold,
                candidates: grouping.potential_duplicates,
                ..DetectStats::default()
            },
            ..DetectReport::default()
        };

        let order = catalog.ordered_indices();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("detect", order.len());
        }

        for (position, &anchor) in order.iter().enumerate() {
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(position + 1, catalog.record(anchor).logical_path());
            }
            if catalog.record(anchor).is_processed() {
                continue;
            }

            let size = catalog.record_mut(anchor).size()?;
            if let Some(group) = self.resolve_anchor(catalog, &buckets, anchor, size, ledger, &mut report)? {
                report.groups.push(group);
            }
            catalog.record_mut(anchor).mark_processed();
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("detect");
        }

        report.count = report.stats.duplicates;
        report.stats.duration = start.elapsed();

        log::info!(
            "Detection complete: {} of {} files collapsed, {} {} in {:.2}s",
            report.count,
            report.stats.records,
            report.stats.reclaimed_display(),
            if self.config.dry_run { "reclaimable" } else { "reclaimed" },
            report.stats.duration.as_secs_f64()
        );
        log::debug!(
            "{} comparisons: {} fingerprint rejections, {} content rejections",
            report.stats.comparisons,
            report.stats.fingerprint_rejections,
            report.stats.content_rejections
        );

        Ok(report)
    }

    /// Compare every later unprocessed record of `size` against `anchor`.
    fn resolve_anchor(
        &self,
        catalog: &mut Catalog,
        buckets: &SizeBuckets,
        anchor: usize,
        size: u64,
        ledger: &mut LedgerBuilder,
        report: &mut DetectReport,
    ) -> Result<Option<DuplicateGroup>, DetectError> {
        let Some(members) = buckets.get(&size) else {
            return Ok(None);
        };

        let mut group = DuplicateGroup::new(size, catalog.record(anchor).logical_path());

        for &candidate in members {
            if candidate == anchor || catalog.record(candidate).is_processed() {
                continue;
            }

            report.stats.comparisons += 1;
            let (anchor_record, candidate_record) = catalog.pair_mut(anchor, candidate);
            let verdict = compare_records(
                anchor_record,
                candidate_record,
                self.config.fingerprint_size,
                self.config.header_window,
            )?;

            match verdict {
                Verdict::FingerprintMismatch => report.stats.fingerprint_rejections += 1,
                Verdict::ContentMismatch => report.stats.content_rejections += 1,
                Verdict::Identical => {
                    let entry = RemapEntry::from_logical(
                        candidate_record.logical_path(),
                        anchor_record.logical_path(),
                    )?;
                    ledger.ensure_vacant(entry.source())?;

                    if !self.config.dry_run {
                        remove_duplicate(candidate_record.path(), size)?;
                    }
                    candidate_record.mark_processed();
                    log::debug!(
                        "Duplicate: {} -> {}",
                        candidate_record.logical_path(),
                        anchor_record.logical_path()
                    );

                    group.duplicates.push(candidate_record.logical_path().to_string());
                    report.entries.push(entry.clone());
                    ledger.insert(entry)?;
                    report.stats.duplicates += 1;
                    report.stats.bytes_reclaimed += size;
                }
            }
        }

        Ok((!group.duplicates.is_empty()).then_some(group))
    }
}

/// Enumerate `root` and collapse its duplicates with default settings.
///
/// # Errors
///
/// See [`DuplicateDetector::run`].
pub fn detect_duplicates(root: &Path) -> Result<DetectReport, DetectError> {
    let mut ledger = LedgerBuilder::new();
    DuplicateDetector::with_defaults().run(root, &mut ledger)
}
