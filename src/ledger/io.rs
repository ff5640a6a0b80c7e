//! Text form of a ledger.
//!
//! ```text
//! ; texdupe remap ledger, 2 entries
//! tex/b.dds	a.dds
//! tex/c.dds	a.dds
//! ```
//!
//! Writers emit a `;` header followed by one `source<TAB>target` line per
//! entry, sorted by source, LF terminated. Readers are lenient: CRLF, blank
//! lines, comments, short lines and extra fields are all tolerated.

use std::fs;
use std::path::Path;

use super::{LedgerError, RemapEntry, RemapLedger, COMMENT_MARKER, FIELD_SEPARATOR};

/// Render entries in the persisted form, sorted by source.
#[must_use]
pub fn render_ledger(ledger: &RemapLedger) -> String {
    let entries = ledger.sorted_entries();
    let mut out = format!(
        "{COMMENT_MARKER} {} remap ledger, {} entries\n",
        env!("CARGO_PKG_NAME"),
        entries.len()
    );
    for entry in &entries {
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out
}

/// Write `ledger` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns [`LedgerError::Io`] if the file cannot be written.
pub fn write_ledger(path: &Path, ledger: &RemapLedger) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| LedgerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, render_ledger(ledger)).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!(
        "Wrote {} ledger entries to {}",
        ledger.len(),
        path.display()
    );
    Ok(())
}

/// Parse ledger text, keeping on-file order.
///
/// Lines that cannot form an entry are skipped rather than rejected.
#[must_use]
pub fn parse_ledger(text: &str) -> RemapLedger {
    let mut entries = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.starts_with(COMMENT_MARKER) {
            continue;
        }

        let mut fields = line.split(FIELD_SEPARATOR);
        let (Some(source), Some(target)) = (fields.next(), fields.next()) else {
            log::debug!("Ledger line {}: no tab separator, ignored", number + 1);
            continue;
        };

        match RemapEntry::new(source.trim(), target.trim()) {
            Ok(entry) => entries.push(entry),
            Err(e) => log::debug!("Ledger line {}: {}, ignored", number + 1, e),
        }
    }

    RemapLedger::from_entries(entries)
}

/// Read and parse the ledger at `path`.
///
/// # Errors
///
/// Returns [`LedgerError::Io`] if the file cannot be read.
pub fn read_ledger(path: &Path) -> Result<RemapLedger, LedgerError> {
    let bytes = fs::read(path).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ledger = parse_ledger(&String::from_utf8_lossy(&bytes));
    log::debug!("Read {} entries from {}", ledger.len(), path.display());
    Ok(ledger)
}
