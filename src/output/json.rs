//! JSON output for dedupe and restore runs.
//!
//! # Dedupe schema
//!
//! ```json
//! {
//!   "root": "extracted/track",
//!   "ledger": "extracted/track/texture_remap.txt",
//!   "dry_run": false,
//!   "groups": [
//!     { "size": 4096, "survivor": "tex/a.dds", "duplicates": ["tex/b.dds"] }
//!   ],
//!   "entries": [ { "source": "tex/b.dds", "target": "a.dds" } ],
//!   "summary": {
//!     "records": 3, "duplicates": 1, "bytes_reclaimed": 4096, "...": "...",
//!     "exit_code": 0, "exit_code_name": "TD000"
//!   }
//! }
//! ```
//!
//! # Restore schema
//!
//! ```json
//! {
//!   "root": "extracted/track",
//!   "ledgers": ["extracted/track/texture_remap.txt"],
//!   "restored": 2, "skipped_existing": 0, "passes": 1, "chains": 0,
//!   "unresolved": [],
//!   "exit_code": 0, "exit_code_name": "TD000"
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::{DetectReport, DetectStats, DuplicateGroup};
use crate::error::ExitCode;
use crate::ledger::RemapEntry;
use crate::restore::RestoreReport;

/// Dedupe summary with the exit code folded in.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDedupeSummary {
    /// Detector counters
    #[serde(flatten)]
    pub stats: DetectStats,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TD000")
    pub exit_code_name: String,
}

/// Complete JSON output of a dedupe run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDedupeOutput {
    /// Scan root as given
    pub root: String,
    /// Ledger written, if any
    pub ledger: Option<String>,
    /// Whether files were left in place
    pub dry_run: bool,
    /// Survivors and the duplicates collapsed onto them
    pub groups: Vec<DuplicateGroup>,
    /// Ledger entries produced by this run
    pub entries: Vec<RemapEntry>,
    /// Run summary
    pub summary: JsonDedupeSummary,
}

impl JsonDedupeOutput {
    /// Build the output for a finished dedupe run.
    #[must_use]
    pub fn new(
        root: &Path,
        ledger: Option<&Path>,
        report: &DetectReport,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            root: root.display().to_string(),
            ledger: ledger.map(|p| p.display().to_string()),
            dry_run: report.dry_run,
            groups: report.groups.clone(),
            entries: report.entries.clone(),
            summary: JsonDedupeSummary {
                stats: report.stats.clone(),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }
}

/// Complete JSON output of a restore run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRestoreOutput {
    /// Restore root as given
    pub root: String,
    /// Ledgers replayed, in order
    pub ledgers: Vec<String>,
    /// Resolver counters and unresolved entries
    #[serde(flatten)]
    pub report: RestoreReport,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "TD003")
    pub exit_code_name: String,
}

impl JsonRestoreOutput {
    /// Build the output for a finished restore run.
    #[must_use]
    pub fn new(root: &Path, ledgers: &[PathBuf], report: &RestoreReport, exit_code: ExitCode) -> Self {
        Self {
            root: root.display().to_string(),
            ledgers: ledgers.iter().map(|p| p.display().to_string()).collect(),
            report: report.clone(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Serialize `value` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<(), JsonOutputError> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON output: {0}")]
    Io(#[from] std::io::Error),
}
