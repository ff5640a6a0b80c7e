//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for texdupe.
///
/// - 0: Success (dedupe collapsed at least one file, or restore resolved everything)
/// - 1: General error (fatal failure, nothing after it was attempted)
/// - 2: No duplicates (dedupe completed, nothing to collapse)
/// - 3: Partial success (restore completed with unresolved entries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the command completed fully.
    Success = 0,
    /// General error: an unexpected or fatal error occurred.
    GeneralError = 1,
    /// No duplicates: dedupe completed but nothing was collapsed.
    NoDuplicates = 2,
    /// Partial success: restore left some ledger entries unresolved.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TD000",
            Self::GeneralError => "TD001",
            Self::NoDuplicates => "TD002",
            Self::PartialSuccess => "TD003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
