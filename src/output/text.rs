//! Human-readable run summaries.
//!
//! Colors come from `yansi` and are switched off globally by the app when
//! `--no-color` is given or stdout is not a terminal.

use std::io::{self, Write};
use std::path::Path;

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::DetectReport;
use crate::restore::RestoreReport;

/// Largest number of groups listed individually.
const MAX_LISTED_GROUPS: usize = 20;

/// Write the summary of a dedupe run.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_dedupe_summary<W: Write>(
    writer: &mut W,
    report: &DetectReport,
    ledger: Option<&Path>,
) -> io::Result<()> {
    let stats = &report.stats;
    let verb = if report.dry_run { "would collapse" } else { "collapsed" };

    if report.count == 0 {
        writeln!(
            writer,
            "{} No duplicates among {} files ({} below threshold)",
            "✓".green(),
            stats.records,
            stats.skipped_small
        )?;
        return Ok(());
    }

    for group in report.groups.iter().take(MAX_LISTED_GROUPS) {
        writeln!(
            writer,
            "{} {}",
            group.survivor.bold(),
            ByteSize::b(group.size).dim()
        )?;
        for duplicate in &group.duplicates {
            writeln!(writer, "  {} {}", "-".red(), duplicate)?;
        }
    }
    if report.groups.len() > MAX_LISTED_GROUPS {
        writeln!(
            writer,
            "  ... and {} more groups",
            report.groups.len() - MAX_LISTED_GROUPS
        )?;
    }

    writeln!(
        writer,
        "{} {} {} {} of {} files into {} survivors, {} freed",
        "✓".green(),
        if report.dry_run { "Dry run:" } else { "Done:" },
        verb,
        report.count.bold(),
        stats.records,
        report.groups.len(),
        stats.reclaimed_display().green()
    )?;

    match ledger {
        Some(path) => writeln!(writer, "Ledger: {}", path.display())?,
        None if report.dry_run => {
            writeln!(writer, "{}", "No ledger written (dry run)".yellow())?;
        }
        None => {}
    }
    Ok(())
}

/// Write the summary of a restore run.
///
/// # Errors
///
/// Returns any error from `writer`.
pub fn write_restore_summary<W: Write>(writer: &mut W, report: &RestoreReport) -> io::Result<()> {
    for entry in &report.unresolved {
        writeln!(
            writer,
            "{} unresolved: {} (target {})",
            "!".yellow(),
            entry.source(),
            entry.target()
        )?;
    }

    let mark = if report.is_complete() {
        "✓".green()
    } else {
        "!".yellow()
    };
    writeln!(
        writer,
        "{} Restored {} files, {} already present, {} unresolved ({} passes)",
        mark,
        report.restored.bold(),
        report.skipped_existing,
        report.unresolved.len(),
        report.passes
    )
}
