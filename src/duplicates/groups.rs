//! Size buckets and resolved duplicate groups.
//!
//! # Overview
//!
//! Files with different sizes cannot be identical, so the detector first
//! buckets catalog records by exact size. Only buckets with two or more
//! records at or above the size threshold are worth comparing.
//!
//! A [`DuplicateGroup`] is what one anchor resolution produced: the surviving
//! anchor and the records removed in its favour. It exists for reporting
//! only and is never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{Catalog, CatalogError};

/// Record indices sharing one size, in logical path order.
pub type SizeBuckets = HashMap<u64, Vec<usize>>;

/// One anchor and the duplicates collapsed onto it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Size shared by every member in bytes
    pub size: u64,
    /// Logical path of the surviving anchor
    pub survivor: String,
    /// Logical paths removed in favour of the survivor
    pub duplicates: Vec<String>,
}

impl DuplicateGroup {
    /// Create a group with no duplicates yet.
    #[must_use]
    pub fn new(size: u64, survivor: impl Into<String>) -> Self {
        Self {
            size,
            survivor: survivor.into(),
            duplicates: Vec::new(),
        }
    }

    /// Total members, survivor included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.duplicates.len() + 1
    }

    /// A group is never empty; it always holds its survivor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of removed members.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Bytes reclaimed by removing the duplicates.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }
}

/// Statistics from bucketing the catalog by size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of records examined
    pub total_files: usize,
    /// Total size of all records in bytes
    pub total_size: u64,
    /// Records below the size threshold, never compared
    pub below_threshold: usize,
    /// Number of distinct sizes at or above the threshold
    pub unique_sizes: usize,
    /// Records that share their size with at least one other
    pub potential_duplicates: usize,
    /// Records alone in their size bucket
    pub eliminated_unique: usize,
    /// Buckets holding two or more records
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of records ruled out before any read.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            ((self.eliminated_unique + self.below_threshold) as f64 / self.total_files as f64)
                * 100.0
        }
    }
}

/// Bucket every catalog record by size.
///
/// Sizes are read from disk here. Records smaller than `min_size` and
/// records with a unique size are left out of the returned buckets.
///
/// # Errors
///
/// Returns the first [`CatalogError`] from a failed size lookup.
pub fn group_by_size(
    catalog: &mut Catalog,
    min_size: u64,
) -> Result<(SizeBuckets, GroupingStats), CatalogError> {
    let mut all_buckets: SizeBuckets = HashMap::new();
    let mut stats = GroupingStats::default();

    for idx in catalog.ordered_indices() {
        let record = catalog.record_mut(idx);
        let size = record.size()?;
        stats.total_files += 1;
        stats.total_size += size;

        if size < min_size {
            stats.below_threshold += 1;
            log::trace!("Below threshold ({} bytes): {}", size, record.logical_path());
            continue;
        }

        all_buckets.entry(size).or_default().push(idx);
    }

    stats.unique_sizes = all_buckets.len();

    let buckets: SizeBuckets = all_buckets
        .into_iter()
        .filter(|(size, members)| {
            if members.len() == 1 {
                stats.eliminated_unique += 1;
                false
            } else {
                stats.potential_duplicates += members.len();
                stats.duplicate_groups += 1;
                log::debug!("Size bucket {} bytes: {} records", size, members.len());
                true
            }
        })
        .collect();

    log::info!(
        "Size grouping: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    Ok((buckets, stats))
}
