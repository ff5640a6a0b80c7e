//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size bucketing of catalog records (see [`groups`])
//! - Byte-exact comparison, fingerprint first (see [`compare`])
//! - Sequential anchor resolution and deletion (see [`detector`])

pub mod compare;
pub mod detector;
pub mod groups;

pub use compare::{compare_records, fingerprints_equal, tails_equal, Verdict, HEADER_WINDOW};
pub use detector::{
    detect_duplicates, DetectError, DetectReport, DetectStats, DetectorConfig, DuplicateDetector,
    MIN_DEDUPE_SIZE,
};
pub use groups::{group_by_size, DuplicateGroup, GroupingStats, SizeBuckets};
