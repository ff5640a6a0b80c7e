//! Output formatters for run summaries.
//!
//! - [`text`]: colored human-readable summary (default)
//! - [`json`]: machine-readable report for scripting

pub mod json;
pub mod text;

pub use json::{write_json, JsonDedupeOutput, JsonOutputError, JsonRestoreOutput};
pub use text::{write_dedupe_summary, write_restore_summary};
