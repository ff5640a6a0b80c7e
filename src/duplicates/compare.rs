//! Byte-exact comparison of two blobs.
//!
//! Two stages, both direct byte comparison:
//!
//! 1. **Fingerprint**: the cached leading bytes of each file. The range
//!    `[header_window, len)` is checked before `[0, header_window)`; texture
//!    headers of same-size files usually agree in their first 128 bytes, so
//!    a difference shows up sooner past that offset.
//! 2. **Tail**: entered only after the fingerprints match, compares the
//!    remaining bytes from the fingerprint length to the end.

use crate::catalog::{CatalogError, FileRecord};

/// Default header window checked last during fingerprint comparison.
pub const HEADER_WINDOW: usize = 128;

/// Outcome of comparing a candidate against an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Byte-for-byte identical.
    Identical,
    /// Rejected on the fingerprint.
    FingerprintMismatch,
    /// Fingerprints matched but later bytes differ.
    ContentMismatch,
}

/// Compare two fingerprints, checking past `header_window` first.
#[must_use]
pub fn fingerprints_equal(a: &[u8], b: &[u8], header_window: usize) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let split = header_window.min(a.len());
    a[split..] == b[split..] && a[..split] == b[..split]
}

/// Compare two full buffers from `offset` to the end.
///
/// Buffers of different length are never equal.
#[must_use]
pub fn tails_equal(a: &[u8], b: &[u8], offset: usize) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let offset = offset.min(a.len());
    a[offset..] == b[offset..]
}

/// Decide whether `candidate` holds exactly the same bytes as `anchor`.
///
/// Both records must already share the same size. Fingerprints are loaded
/// lazily; full content is loaded only when the fingerprints match. The
/// candidate's full-content buffer is released again on a mismatch so at
/// most the anchor's content stays resident between candidates.
///
/// # Errors
///
/// Any read failure on either side is returned unchanged; the caller must
/// treat it as fatal.
pub fn compare_records(
    anchor: &mut FileRecord,
    candidate: &mut FileRecord,
    fingerprint_size: usize,
    header_window: usize,
) -> Result<Verdict, CatalogError> {
    let anchor_len = anchor.fingerprint_size(fingerprint_size)?;
    let candidate_len = candidate.fingerprint_size(fingerprint_size)?;
    if anchor_len != candidate_len
        || !fingerprints_equal(anchor.fingerprint(), candidate.fingerprint(), header_window)
    {
        log::trace!(
            "Fingerprint mismatch: {} vs {}",
            anchor.logical_path(),
            candidate.logical_path()
        );
        return Ok(Verdict::FingerprintMismatch);
    }

    let anchor_total = anchor.load_content()?;
    let candidate_total = candidate.load_content()?;
    if anchor_total == candidate_total
        && tails_equal(anchor.content(), candidate.content(), anchor_len)
    {
        return Ok(Verdict::Identical);
    }

    log::trace!(
        "Content mismatch past fingerprint: {} vs {}",
        anchor.logical_path(),
        candidate.logical_path()
    );
    candidate.release_content();
    Ok(Verdict::ContentMismatch)
}
