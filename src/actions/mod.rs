//! File actions module.
//!
//! Currently a single action: verified permanent removal of a confirmed
//! duplicate (see [`delete`]). Removed files are recoverable only through
//! the remap ledger.

pub mod delete;

pub use delete::{remove_duplicate, DeleteError, DeleteResult, FileSnapshot};
