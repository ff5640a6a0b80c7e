//! Fixed-point ledger replay.
//!
//! # Algorithm
//!
//! 1. Every ledger's entries are queued in reverse of their on-file order.
//! 2. For each pending entry: if the source already exists it is skipped;
//!    if the repaired target is missing the entry is deferred; otherwise the
//!    target is copied to the source.
//! 3. Deferred entries are retried until none remain or a pass resolves
//!    nothing, which is detected by the pending count not shrinking.
//!
//! Entries still pending at the end have a target outside the tree and
//! outside every ledger. They are reported, not fatal.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::{RestoreError, TreeIndex};
use crate::ledger::{qualify_target, ArchiveNames, RemapEntry, RemapLedger};
use crate::progress::ProgressCallback;

/// Configuration for a restore run.
#[derive(Clone, Default)]
pub struct RestoreConfig {
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for RestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreConfig")
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl RestoreConfig {
    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// Outcome of a restore run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestoreReport {
    /// Sources re-created by copying their target
    pub restored: usize,
    /// Entries whose source was already present
    pub skipped_existing: usize,
    /// Passes over the pending set
    pub passes: usize,
    /// Entry links where a target was itself a deleted source
    pub chains: usize,
    /// Entries whose target never appeared
    pub unresolved: Vec<RemapEntry>,
    /// Wall time of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl RestoreReport {
    /// Whether every entry was resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// One queued ledger entry with its lookup keys.
#[derive(Debug)]
struct Pending {
    entry: RemapEntry,
    target: String,
}

/// Replays ledgers against a tree.
///
/// # Example
///
/// ```no_run
/// use texdupe::ledger::read_ledger;
/// use texdupe::restore::RestoreResolver;
/// use std::path::Path;
///
/// let root = Path::new("extracted/track");
/// let ledger = read_ledger(&root.join("texture_remap.txt")).unwrap();
/// let report = RestoreResolver::with_defaults().restore(root, &[ledger]).unwrap();
///
/// println!("{} restored, {} unresolved", report.restored, report.unresolved.len());
/// ```
#[derive(Debug)]
pub struct RestoreResolver {
    config: RestoreConfig,
}

impl RestoreResolver {
    /// Create a resolver with the given configuration.
    #[must_use]
    pub fn new(config: RestoreConfig) -> Self {
        Self { config }
    }

    /// Create a resolver with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RestoreConfig::default())
    }

    /// Re-create every deleted source listed in `ledgers` under `root`.
    ///
    /// # Errors
    ///
    /// Fails if `root` is not a directory, the tree cannot be indexed, or a
    /// directory creation or copy fails. Unresolvable entries are not errors.
    pub fn restore(
        &self,
        root: &Path,
        ledgers: &[RemapLedger],
    ) -> Result<RestoreReport, RestoreError> {
        let start = Instant::now();
        if !root.exists() {
            return Err(RestoreError::NotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(RestoreError::NotADirectory(root.to_path_buf()));
        }

        let mut index = TreeIndex::scan(root)?;
        log::debug!(
            "Indexed {} files under {}",
            index.file_count(),
            index.root().display()
        );
        let mut archives = ArchiveNames::from_ledgers(ledgers);
        archives.extend(index.top_level_dirs().map(str::to_string).collect::<Vec<_>>());

        let mut report = RestoreReport {
            chains: ledgers
                .iter()
                .map(|ledger| ledger.chains(&archives).len())
                .sum(),
            ..RestoreReport::default()
        };

        let mut pending: Vec<Pending> = ledgers
            .iter()
            .flat_map(|ledger| ledger.entries().iter().rev())
            .map(|entry| Pending {
                target: qualify_target(entry.source(), entry.target(), &archives),
                entry: entry.clone(),
            })
            .collect();

        log::info!(
            "Restoring {} ledger entries into {} ({} archives, {} chain links)",
            pending.len(),
            root.display(),
            archives.len(),
            report.chains
        );
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("restore", pending.len());
        }

        loop {
            report.passes += 1;
            let before = pending.len();
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_message(&format!("pass {}, {} pending", report.passes, before));
            }
            let mut deferred = Vec::new();

            for item in pending {
                let source = item.entry.source();
                if index.contains_file(source) {
                    log::trace!("Already present: {}", source);
                    report.skipped_existing += 1;
                } else if let Some(from) = index.file(&item.target).map(Path::to_path_buf) {
                    let to = index.placement(source);
                    copy_into_place(&from, &to)?;
                    log::debug!("Restored {} from {}", source, item.target);
                    index.record_file(source, to);
                    report.restored += 1;
                } else {
                    deferred.push(item);
                    continue;
                }

                if let Some(ref callback) = self.config.progress_callback {
                    callback.on_progress(report.restored + report.skipped_existing, source);
                }
            }

            pending = deferred;
            log::debug!(
                "Restore pass {}: {} of {} entries still pending",
                report.passes,
                pending.len(),
                before
            );
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("restore");
        }

        for item in &pending {
            log::warn!(
                "Unresolved ledger entry: {} (target {} not found)",
                item.entry.source(),
                item.target
            );
        }
        report.unresolved = pending.into_iter().map(|item| item.entry).collect();
        report.duration = start.elapsed();

        log::info!(
            "Restore complete: {} restored, {} already present, {} unresolved after {} passes",
            report.restored,
            report.skipped_existing,
            report.unresolved.len(),
            report.passes
        );

        Ok(report)
    }
}

/// Restore `root` from `ledgers` with default settings.
///
/// # Errors
///
/// See [`RestoreResolver::restore`].
pub fn restore_from_ledgers(
    root: &Path,
    ledgers: &[RemapLedger],
) -> Result<RestoreReport, RestoreError> {
    RestoreResolver::with_defaults().restore(root, ledgers)
}

fn copy_into_place(from: &Path, to: &Path) -> Result<(), RestoreError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| RestoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(from, to).map_err(|source| {
        log::error!("Copy {} -> {} failed: {}", from.display(), to.display(), source);
        RestoreError::Io {
            path: to.to_path_buf(),
            source,
        }
    })?;
    Ok(())
}
