//! Command-line interface definitions for texdupe.
//!
//! This module defines all CLI arguments and subcommands using the clap
//! derive API. Global options (verbosity, color, config file, error format)
//! apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Collapse duplicate textures and write texture_remap.txt into the root
//! texdupe dedupe extracted/track
//!
//! # See what would be collapsed, as JSON
//! texdupe dedupe extracted/track --dry-run --output json
//!
//! # Put every deleted texture back
//! texdupe restore extracted/track
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Texture deduplication with a reversible remap ledger.
///
/// texdupe deletes byte-identical texture files from an extracted archive
/// tree, keeping one survivor per content, and records every deletion in a
/// ledger so that the tree can be restored exactly.
#[derive(Debug, Parser)]
#[command(name = "texdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE", env = "TEXDUPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Delete duplicate textures and record them in a remap ledger
    Dedupe(DedupeArgs),
    /// Re-create deleted textures from one or more remap ledgers
    Restore(RestoreArgs),
}

/// Arguments for the dedupe subcommand.
#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// Root of the extracted texture tree
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Ledger file to write (default: <ROOT>/<ledger_name>)
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Extension of the files to compare (default: dds)
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Minimum file size to deduplicate (e.g., 1024, 1KiB, 4KB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Follow symbolic links during enumeration
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Compare and report only; delete nothing and write no ledger
    #[arg(long)]
    pub dry_run: bool,

    /// Replace an existing ledger instead of extending it
    #[arg(long)]
    pub fresh_ledger: bool,

    /// Output format for the summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the restore subcommand.
#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Root of the extracted texture tree
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Ledger file(s) to replay, in order (default: <ROOT>/<ledger_name>)
    #[arg(long = "ledger", value_name = "FILE")]
    pub ledgers: Vec<PathBuf>,

    /// Output format for the summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format for run summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use texdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("4MiB").unwrap(), 4_194_304);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    if num_str.is_empty() {
        return Err(format!("Missing number in '{s}'"));
    }
    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
