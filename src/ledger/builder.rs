//! Ledger accumulation with unique sources.

use std::collections::HashMap;

use super::{LedgerError, RemapEntry, RemapLedger};

/// Collects [`RemapEntry`] values for one run.
///
/// Sources are unique: a second entry for the same source is rejected.
/// Insertion order is kept; the persisted form is sorted separately.
#[derive(Debug, Default, Clone)]
pub struct LedgerBuilder {
    entries: Vec<RemapEntry>,
    sources: HashMap<String, usize>,
}

impl LedgerBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder with the entries of an existing ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateSource`] if the ledger repeats a source.
    pub fn from_ledger(ledger: RemapLedger) -> Result<Self, LedgerError> {
        let mut builder = Self::new();
        for entry in ledger.into_entries() {
            builder.insert(entry)?;
        }
        Ok(builder)
    }

    /// Check that `source` has no entry yet.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateSource`] if it does.
    pub fn ensure_vacant(&self, source: &str) -> Result<(), LedgerError> {
        if self.sources.contains_key(source) {
            return Err(LedgerError::DuplicateSource(source.to_string()));
        }
        Ok(())
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateSource`] if its source is already present.
    pub fn insert(&mut self, entry: RemapEntry) -> Result<(), LedgerError> {
        self.ensure_vacant(entry.source())?;
        self.sources
            .insert(entry.source().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Whether `source` has an entry.
    #[must_use]
    pub fn contains_source(&self, source: &str) -> bool {
        self.sources.contains_key(source)
    }

    /// Keep only the entries for which `keep` returns true.
    ///
    /// Returns the number of entries removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&RemapEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| keep(entry));
        self.sources = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.source().to_string(), idx))
            .collect();
        before - self.entries.len()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[RemapEntry] {
        &self.entries
    }

    /// Finish into a ledger, keeping insertion order.
    #[must_use]
    pub fn build(self) -> RemapLedger {
        RemapLedger::from_entries(self.entries)
    }
}
