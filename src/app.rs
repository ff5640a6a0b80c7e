//! Command dispatch for the texdupe binary.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, DedupeArgs, OutputFormat, RestoreArgs};
use crate::config::Config;
use crate::duplicates::{DetectReport, DuplicateDetector};
use crate::error::ExitCode;
use crate::ledger::{read_ledger, write_ledger, LedgerBuilder};
use crate::logging::init_logging;
use crate::output::{
    write_dedupe_summary, write_json, write_restore_summary, JsonDedupeOutput, JsonRestoreOutput,
};
use crate::progress::{Progress, ProgressCallback};
use crate::restore::{RestoreConfig, RestoreResolver, TreeIndex};

/// Run the command described by `cli` and return the process exit code.
///
/// # Errors
///
/// Any fatal error from configuration, detection, ledger I/O or restore.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);
    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }
    log::debug!("{} {} starting", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let progress: Arc<dyn ProgressCallback> = Arc::new(Progress::new(cli.quiet));

    match cli.command {
        Commands::Dedupe(args) => run_dedupe(config, &args, progress),
        Commands::Restore(args) => run_restore(&config, &args, progress),
    }
}

/// Run `dedupe` with an already loaded configuration.
///
/// An existing ledger is extended unless `--fresh-ledger` is given. If
/// detection fails part-way, the entries for files already removed are
/// still written before the error is returned.
///
/// # Errors
///
/// Invalid configuration, ledger I/O, or any fatal detection error.
pub fn run_dedupe(
    mut config: Config,
    args: &DedupeArgs,
    progress: Arc<dyn ProgressCallback>,
) -> Result<ExitCode> {
    config.merge_dedupe_args(args);
    config.validate().context("Invalid configuration")?;

    let root = args.root.as_path();
    let ledger_path = args
        .ledger
        .clone()
        .unwrap_or_else(|| config.ledger_path(root));

    let (mut ledger, pruned) = if args.fresh_ledger || !ledger_path.is_file() {
        (LedgerBuilder::new(), 0)
    } else {
        extend_existing_ledger(root, &ledger_path)?
    };
    let seeded = ledger.len();

    let detector = DuplicateDetector::new(
        config
            .detector_config()
            .with_dry_run(args.dry_run)
            .with_progress_callback(progress),
    );

    let report = match detector.run(root, &mut ledger) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Duplicate detection aborted: {}", e);
            if !args.dry_run && ledger.len() > seeded {
                salvage_ledger(&ledger_path, ledger);
            }
            return Err(e).context(format!("Duplicate detection failed in {}", root.display()));
        }
    };

    let written = if args.dry_run {
        None
    } else if report.count > 0 || pruned > 0 {
        write_ledger(&ledger_path, &ledger.build())
            .with_context(|| format!("Failed to write ledger {}", ledger_path.display()))?;
        Some(ledger_path)
    } else {
        log::info!("Nothing collapsed; ledger left untouched");
        None
    };

    let exit_code = if report.count == 0 {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };
    emit_dedupe(args.output, root, written.as_deref(), &report, exit_code)?;
    Ok(exit_code)
}

/// Seed a builder from an existing ledger, dropping entries whose source is
/// back on disk (restored since the ledger was written).
fn extend_existing_ledger(root: &Path, ledger_path: &Path) -> Result<(LedgerBuilder, usize)> {
    let existing = read_ledger(ledger_path)
        .with_context(|| format!("Failed to read ledger {}", ledger_path.display()))?;
    let mut builder = LedgerBuilder::from_ledger(existing)
        .with_context(|| format!("Ledger {} is inconsistent", ledger_path.display()))?;

    let tree = TreeIndex::scan(root).with_context(|| format!("Failed to index {}", root.display()))?;
    let pruned = builder.retain(|entry| !tree.contains_file(entry.source()));
    if pruned > 0 {
        log::info!("Dropped {} stale ledger entries whose source exists again", pruned);
    }
    log::info!(
        "Extending ledger {} ({} entries)",
        ledger_path.display(),
        builder.len()
    );
    Ok((builder, pruned))
}

/// Persist whatever was removed before a fatal error.
fn salvage_ledger(ledger_path: &Path, ledger: LedgerBuilder) {
    match write_ledger(ledger_path, &ledger.build()) {
        Ok(()) => log::warn!(
            "Partial ledger written to {}; files removed so far can be restored",
            ledger_path.display()
        ),
        Err(e) => log::error!("Could not write partial ledger: {}", e),
    }
}

fn emit_dedupe(
    format: OutputFormat,
    root: &Path,
    ledger: Option<&Path>,
    report: &DetectReport,
    exit_code: ExitCode,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => write_dedupe_summary(&mut out, report, ledger)?,
        OutputFormat::Json => {
            write_json(&mut out, &JsonDedupeOutput::new(root, ledger, report, exit_code))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_restore(
    config: &Config,
    args: &RestoreArgs,
    progress: Arc<dyn ProgressCallback>,
) -> Result<ExitCode> {
    let root = args.root.as_path();
    let ledger_paths: Vec<PathBuf> = if args.ledgers.is_empty() {
        vec![config.ledger_path(root)]
    } else {
        args.ledgers.clone()
    };

    let ledgers = ledger_paths
        .iter()
        .map(|path| {
            read_ledger(path).with_context(|| format!("Failed to read ledger {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let resolver = RestoreResolver::new(RestoreConfig::default().with_progress_callback(progress));
    let report = resolver
        .restore(root, &ledgers)
        .with_context(|| format!("Restore failed in {}", root.display()))?;

    let exit_code = if report.is_complete() {
        ExitCode::Success
    } else {
        ExitCode::PartialSuccess
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => write_restore_summary(&mut out, &report)?,
        OutputFormat::Json => write_json(
            &mut out,
            &JsonRestoreOutput::new(root, &ledger_paths, &report, exit_code),
        )?,
    }
    out.flush()?;

    Ok(exit_code)
}
