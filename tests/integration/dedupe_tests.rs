use std::fs;
use std::path::Path;
use tempfile::tempdir;
use texdupe::duplicates::{DetectorConfig, DuplicateDetector};
use texdupe::ledger::{render_ledger, LedgerBuilder};

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn texture(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed))
        .collect()
}

fn run(root: &Path) -> (texdupe::duplicates::DetectReport, LedgerBuilder) {
    let mut ledger = LedgerBuilder::new();
    let report = DuplicateDetector::with_defaults()
        .run(root, &mut ledger)
        .unwrap();
    (report, ledger)
}

#[test]
fn test_identical_pair_with_near_miss() {
    let dir = tempdir().unwrap();
    let root = dir.path();

    let same = vec![b'Z'; 100_000];
    let mut near = vec![b'Z'; 99_999];
    near.push(b'Y');
    write(root, "tex/a.dds", &same);
    write(root, "tex/b.dds", &same);
    write(root, "tex/c.dds", &near);

    let (report, ledger) = run(root);

    assert_eq!(report.count, 1);
    assert!(root.join("tex/a.dds").exists());
    assert!(!root.join("tex/b.dds").exists());
    assert_eq!(fs::read(root.join("tex/c.dds")).unwrap(), near);

    // The survivor shares the source's archive segment, so the target is
    // stored without it; restore puts `tex/` back in front of `a.dds`.
    let text = render_ledger(&ledger.build());
    assert_eq!(text, "; texdupe remap ledger, 1 entries\ntex/b.dds\ta.dds\n");
}

#[test]
fn test_three_copies_collapse_onto_first() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(4096, 3);
    for name in ["tex/c.dds", "tex/a.dds", "tex/b.dds"] {
        write(root, name, &content);
    }

    let (report, ledger) = run(root);

    assert_eq!(report.count, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].survivor, "tex/a.dds");
    assert_eq!(report.stats.bytes_reclaimed, 2 * 4096);
    assert!(root.join("tex/a.dds").exists());
    assert!(!root.join("tex/b.dds").exists());
    assert!(!root.join("tex/c.dds").exists());

    let lines: Vec<String> = ledger.entries().iter().map(|e| e.to_line()).collect();
    assert_eq!(lines, vec!["tex/b.dds\ta.dds", "tex/c.dds\ta.dds"]);
}

#[test]
fn test_small_files_preserved() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(1023, 9);
    write(root, "tex/a.dds", &content);
    write(root, "tex/b.dds", &content);

    let (report, ledger) = run(root);

    assert_eq!(report.count, 0);
    assert_eq!(report.stats.skipped_small, 2);
    assert!(ledger.is_empty());
    assert!(root.join("tex/a.dds").exists());
    assert!(root.join("tex/b.dds").exists());
}

#[test]
fn test_threshold_is_inclusive() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(1024, 9);
    write(root, "tex/a.dds", &content);
    write(root, "tex/b.dds", &content);

    let (report, _) = run(root);

    assert_eq!(report.count, 1);
    assert!(!root.join("tex/b.dds").exists());
}

#[test]
fn test_header_difference_rejected_by_fingerprint() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let a = texture(8192, 1);
    let mut b = a.clone();
    b[10] ^= 0xFF;
    write(root, "tex/a.dds", &a);
    write(root, "tex/b.dds", &b);

    let (report, _) = run(root);

    assert_eq!(report.count, 0);
    assert_eq!(report.stats.fingerprint_rejections, 1);
    assert_eq!(report.stats.content_rejections, 0);
}

#[test]
fn test_tail_difference_rejected_by_content() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let a = texture(16_384, 1);
    let mut b = a.clone();
    *b.last_mut().unwrap() ^= 0xFF;
    write(root, "tex/a.dds", &a);
    write(root, "tex/b.dds", &b);

    let (report, _) = run(root);

    assert_eq!(report.count, 0);
    assert_eq!(report.stats.fingerprint_rejections, 0);
    assert_eq!(report.stats.content_rejections, 1);
    assert!(root.join("tex/b.dds").exists());
}

#[test]
fn test_cross_archive_target_keeps_archive_segment() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(2048, 5);
    write(root, "arc2/y.dds", &content);
    write(root, "arc1/x.dds", &content);

    let (report, ledger) = run(root);

    assert_eq!(report.count, 1);
    let lines: Vec<String> = ledger.entries().iter().map(|e| e.to_line()).collect();
    assert_eq!(lines, vec!["arc2/y.dds\tarc1/x.dds"]);
    assert!(root.join("arc1/x.dds").exists());
}

#[test]
fn test_mixed_case_names_are_lowercased_in_ledger() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(2048, 11);
    write(root, "Tex/Sub/B.DDS", &content);
    write(root, "Tex/Sub/a.dds", &content);

    let (report, ledger) = run(root);

    assert_eq!(report.count, 1);
    assert!(!root.join("Tex/Sub/B.DDS").exists());
    let lines: Vec<String> = ledger.entries().iter().map(|e| e.to_line()).collect();
    assert_eq!(lines, vec!["tex/sub/b.dds\tsub/a.dds"]);
}

#[test]
fn test_other_extensions_untouched() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(4096, 2);
    write(root, "tex/a.png", &content);
    write(root, "tex/b.png", &content);

    let (report, _) = run(root);

    assert_eq!(report.stats.records, 0);
    assert!(root.join("tex/a.png").exists());
    assert!(root.join("tex/b.png").exists());
}

#[test]
fn test_custom_extension() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(4096, 2);
    write(root, "tex/a.tga", &content);
    write(root, "tex/b.tga", &content);

    let walker = texdupe::catalog::WalkerConfig::default().with_extension("tga");
    let detector = DuplicateDetector::new(DetectorConfig::default().with_walker_config(walker));
    let mut ledger = LedgerBuilder::new();
    let report = detector.run(root, &mut ledger).unwrap();

    assert_eq!(report.count, 1);
    assert!(!root.join("tex/b.tga").exists());
}

#[test]
fn test_dry_run_reports_without_deleting() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    let content = texture(4096, 4);
    write(root, "tex/a.dds", &content);
    write(root, "tex/b.dds", &content);

    let detector = DuplicateDetector::new(DetectorConfig::default().with_dry_run(true));
    let mut ledger = LedgerBuilder::new();
    let report = detector.run(root, &mut ledger).unwrap();

    assert!(report.dry_run);
    assert_eq!(report.count, 1);
    assert_eq!(report.entries.len(), 1);
    assert!(root.join("tex/b.dds").exists());
}

#[test]
fn test_survivors_are_pairwise_distinct() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for i in 0..12u8 {
        let content = texture(3000, i % 4);
        write(root, &format!("tex/{i:02}.dds"), &content);
    }

    let (report, ledger) = run(root);
    assert_eq!(report.count, 8);
    assert_eq!(ledger.len(), 8);

    let mut survivors: Vec<Vec<u8>> = fs::read_dir(root.join("tex"))
        .unwrap()
        .map(|e| fs::read(e.unwrap().path()).unwrap())
        .collect();
    assert_eq!(survivors.len(), 4);
    survivors.sort();
    survivors.dedup();
    assert_eq!(survivors.len(), 4);
}

#[test]
fn test_missing_root_is_an_error() {
    let dir = tempdir().unwrap();
    let mut ledger = LedgerBuilder::new();
    let result = DuplicateDetector::with_defaults().run(&dir.path().join("missing"), &mut ledger);
    assert!(result.is_err());
}
