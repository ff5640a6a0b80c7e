//! texdupe - texture deduplication with a reversible remap ledger.
//!
//! Byte-identical texture files under an extracted archive tree are collapsed
//! onto one survivor each. Every deletion is recorded as a `source -> target`
//! line in a remap ledger, which a loader uses to redirect lookups and which
//! [`restore`] replays to re-create the original tree.
//!
//! Comparison is direct byte comparison (fingerprint first, then full
//! content); no hashing is involved.

pub mod actions;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod progress;
pub mod restore;

pub use app::run_app;
