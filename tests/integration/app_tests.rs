use clap::Parser;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};
use texdupe::app::run_dedupe;
use texdupe::cli::{Cli, Commands};
use texdupe::config::Config;
use texdupe::error::ExitCode;
use texdupe::ledger::read_ledger;
use texdupe::progress::ProgressCallback;
use texdupe::run_app;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn texture(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(17).wrapping_add(seed))
        .collect()
}

/// Temp workspace with an empty config file so the user's own config is
/// never picked up.
fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let root = dir.path().join("track");
    fs::create_dir_all(&root).unwrap();
    (dir, config, root)
}

fn run(config: &Path, args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["texdupe", "--quiet", "--no-color", "--config"];
    argv.push(config.to_str().unwrap());
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

fn ledger_lines(path: &Path) -> Vec<String> {
    read_ledger(path)
        .unwrap()
        .sorted_entries()
        .iter()
        .map(|e| e.to_line())
        .collect()
}

#[test]
fn test_dedupe_writes_default_ledger() {
    let (_dir, config, root) = workspace();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));

    let code = run(&config, &["dedupe", root.to_str().unwrap(), "--output", "json"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!root.join("tex/b.dds").exists());
    assert_eq!(
        ledger_lines(&root.join("texture_remap.txt")),
        vec!["tex/b.dds\ta.dds"]
    );
}

#[test]
fn test_dedupe_nothing_found() {
    let (_dir, config, root) = workspace();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 2));

    let code = run(&config, &["dedupe", root.to_str().unwrap()]).unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(!root.join("texture_remap.txt").exists());
}

#[test]
fn test_dry_run_writes_no_ledger() {
    let (_dir, config, root) = workspace();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));

    let code = run(&config, &["dedupe", root.to_str().unwrap(), "--dry-run"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(root.join("tex/b.dds").exists());
    assert!(!root.join("texture_remap.txt").exists());
}

#[test]
fn test_min_size_flag_overrides_default() {
    let (_dir, config, root) = workspace();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));

    let code = run(
        &config,
        &["dedupe", root.to_str().unwrap(), "--min-size", "4KiB"],
    )
    .unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(root.join("tex/b.dds").exists());
}

#[test]
fn test_second_run_extends_ledger() {
    let (_dir, config, root) = workspace();
    let root_arg = root.to_str().unwrap();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));
    run(&config, &["dedupe", root_arg]).unwrap();

    write(&root, "tex/d.dds", &texture(3000, 4));
    write(&root, "tex/e.dds", &texture(3000, 4));
    let code = run(&config, &["dedupe", root_arg]).unwrap();

    assert_eq!(code, ExitCode::Success);
    let ledger = root.join("texture_remap.txt");
    assert_eq!(
        ledger_lines(&ledger),
        vec!["tex/b.dds\ta.dds", "tex/e.dds\td.dds"]
    );

    let code = run(&config, &["restore", root_arg]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read(root.join("tex/b.dds")).unwrap(), texture(2048, 1));
    assert_eq!(fs::read(root.join("tex/e.dds")).unwrap(), texture(3000, 4));
}

#[test]
fn test_fresh_ledger_replaces_existing() {
    let (_dir, config, root) = workspace();
    let root_arg = root.to_str().unwrap();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));
    run(&config, &["dedupe", root_arg]).unwrap();

    write(&root, "tex/d.dds", &texture(3000, 4));
    write(&root, "tex/e.dds", &texture(3000, 4));
    run(&config, &["dedupe", root_arg, "--fresh-ledger"]).unwrap();

    assert_eq!(
        ledger_lines(&root.join("texture_remap.txt")),
        vec!["tex/e.dds\td.dds"]
    );
}

#[test]
fn test_dedupe_after_restore_prunes_stale_entries() {
    let (_dir, config, root) = workspace();
    let root_arg = root.to_str().unwrap();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));

    run(&config, &["dedupe", root_arg]).unwrap();
    run(&config, &["restore", root_arg]).unwrap();
    assert!(root.join("tex/b.dds").exists());

    let code = run(&config, &["dedupe", root_arg]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(!root.join("tex/b.dds").exists());
    assert_eq!(
        ledger_lines(&root.join("texture_remap.txt")),
        vec!["tex/b.dds\ta.dds"]
    );
}

#[test]
fn test_restore_with_unresolved_entries_is_partial() {
    let (dir, config, root) = workspace();
    write(&root, "tex/a.dds", b"a");
    let ledger = dir.path().join("custom.txt");
    fs::write(&ledger, "tex/b.dds\ta.dds\ntex/c.dds\tmissing.dds\n").unwrap();

    let code = run(
        &config,
        &[
            "restore",
            root.to_str().unwrap(),
            "--ledger",
            ledger.to_str().unwrap(),
            "--output",
            "json",
        ],
    )
    .unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(root.join("tex/b.dds").exists());
    assert!(!root.join("tex/c.dds").exists());
}

#[test]
fn test_restore_without_ledger_fails() {
    let (_dir, config, root) = workspace();
    let err = run(&config, &["restore", root.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read ledger"));
}

#[test]
fn test_missing_config_file_fails() {
    let (dir, _config, root) = workspace();
    let missing = dir.path().join("nope.toml");
    let err = run(&missing, &["dedupe", root.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("Config file not found"));
}

#[test]
fn test_invalid_config_value_fails() {
    let (_dir, config, root) = workspace();
    fs::write(&config, "fingerprint_size = 0\n").unwrap();
    let err = run(&config, &["dedupe", root.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("fingerprint_size"));
}

#[test]
fn test_missing_root_fails() {
    let (dir, config, _root) = workspace();
    let missing = dir.path().join("absent");
    assert!(run(&config, &["dedupe", missing.to_str().unwrap()]).is_err());
}

/// Grows `victim` by one byte once detection reaches `trigger`, so the
/// comparison against it fails after earlier duplicates were removed.
struct GrowDuringDetect {
    trigger: String,
    victim: PathBuf,
    detecting: Mutex<bool>,
}

impl ProgressCallback for GrowDuringDetect {
    fn on_phase_start(&self, phase: &str, _total: usize) {
        *self.detecting.lock().unwrap() = phase == "detect";
    }

    fn on_progress(&self, _current: usize, path: &str) {
        if *self.detecting.lock().unwrap() && path == self.trigger {
            let mut file = OpenOptions::new().append(true).open(&self.victim).unwrap();
            file.write_all(b"!").unwrap();
        }
    }

    fn on_phase_end(&self, _phase: &str) {}
}

#[test]
fn test_failed_dedupe_keeps_ledger_for_removed_files() {
    let (_dir, config, root) = workspace();
    let root_arg = root.to_str().unwrap();
    write(&root, "tex/a.dds", &texture(2048, 1));
    write(&root, "tex/b.dds", &texture(2048, 1));
    write(&root, "tex/d.dds", &texture(3000, 4));
    write(&root, "tex/e.dds", &texture(3000, 4));

    let cli = Cli::try_parse_from(["texdupe", "dedupe", root_arg]).unwrap();
    let Commands::Dedupe(args) = cli.command else {
        panic!("expected dedupe");
    };
    let progress = Arc::new(GrowDuringDetect {
        trigger: "tex/d.dds".to_string(),
        victim: root.join("tex/e.dds"),
        detecting: Mutex::new(false),
    });

    let err = run_dedupe(Config::default(), &args, progress).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate detection failed"));

    // b.dds was removed before the failure; e.dds never was.
    assert!(!root.join("tex/b.dds").exists());
    assert!(root.join("tex/e.dds").exists());
    let ledger = root.join("texture_remap.txt");
    assert_eq!(ledger_lines(&ledger), vec!["tex/b.dds\ta.dds"]);

    let code = run(&config, &["restore", root_arg]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read(root.join("tex/b.dds")).unwrap(), texture(2048, 1));
}
