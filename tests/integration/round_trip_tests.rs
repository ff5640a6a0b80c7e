use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use texdupe::duplicates::DuplicateDetector;
use texdupe::ledger::{read_ledger, write_ledger, LedgerBuilder};
use texdupe::restore::restore_from_ledgers;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn texture(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(13).wrapping_add(seed))
        .collect()
}

/// Map of relative path to content for every `.dds` file under `root`.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "dds"))
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap();
            let key = rel.to_string_lossy().replace('\\', "/");
            (key, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn dedupe_into_ledger(root: &Path, ledger_path: &Path) -> usize {
    let mut ledger = LedgerBuilder::new();
    let report = DuplicateDetector::with_defaults()
        .run(root, &mut ledger)
        .unwrap();
    write_ledger(ledger_path, &ledger.build()).unwrap();
    report.count
}

#[test]
fn test_dedupe_then_restore_reproduces_tree() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("track");

    write(&root, "base/tex/road.dds", &texture(5000, 1));
    write(&root, "base/tex/road_copy.dds", &texture(5000, 1));
    write(&root, "base/tex/sky.dds", &texture(5000, 2));
    write(&root, "base/tex/deep/sky2.dds", &texture(5000, 2));
    write(&root, "skins/car/road.dds", &texture(5000, 1));
    write(&root, "skins/car/tiny.dds", &texture(100, 1));
    write(&root, "skins/car/tiny2.dds", &texture(100, 1));
    write(&root, "skins/car/only.dds", &texture(7000, 3));

    let before = snapshot(&root);
    let ledger_path = dir.path().join("texture_remap.txt");

    let count = dedupe_into_ledger(&root, &ledger_path);
    assert_eq!(count, 3);
    assert_eq!(snapshot(&root).len(), before.len() - 3);

    let ledger = read_ledger(&ledger_path).unwrap();
    let report = restore_from_ledgers(&root, &[ledger]).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.restored, 3);
    assert_eq!(snapshot(&root), before);
}

#[test]
fn test_second_dedupe_after_restore_matches_first() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("track");
    for i in 0..6u8 {
        write(&root, &format!("arc/t{i}.dds"), &texture(2048, i % 2));
    }
    let before = snapshot(&root);
    let ledger_path = dir.path().join("remap.txt");

    let first = dedupe_into_ledger(&root, &ledger_path);
    let first_text = fs::read_to_string(&ledger_path).unwrap();

    let ledger = read_ledger(&ledger_path).unwrap();
    restore_from_ledgers(&root, &[ledger]).unwrap();
    assert_eq!(snapshot(&root), before);

    let second = dedupe_into_ledger(&root, &ledger_path);
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&ledger_path).unwrap(), first_text);
}

#[test]
fn test_loose_file_under_root_never_becomes_a_survivor() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("track");

    let x = texture(4096, 1);
    let y = texture(4096, 2);
    // Same name as an archived texture with different bytes.
    write(&root, "a.dds", &x);
    write(&root, "tex/a.dds", &y);
    write(&root, "tex/b.dds", &x);
    write(&root, "tex/c.dds", &x);

    let ledger_path = dir.path().join("texture_remap.txt");
    let count = dedupe_into_ledger(&root, &ledger_path);

    assert_eq!(count, 1);
    assert_eq!(fs::read(root.join("a.dds")).unwrap(), x);
    assert_eq!(fs::read(root.join("tex/b.dds")).unwrap(), x);
    assert!(!root.join("tex/c.dds").exists());

    let ledger = read_ledger(&ledger_path).unwrap();
    let lines: Vec<String> = ledger.entries().iter().map(|e| e.to_line()).collect();
    assert_eq!(lines, vec!["tex/c.dds\tb.dds"]);

    let report = restore_from_ledgers(&root, &[ledger]).unwrap();
    assert!(report.is_complete());
    assert_eq!(fs::read(root.join("tex/c.dds")).unwrap(), x);
    assert_eq!(fs::read(root.join("tex/a.dds")).unwrap(), y);
}
