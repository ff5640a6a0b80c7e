use std::fs;
use std::path::Path;
use tempfile::tempdir;
use texdupe::ledger::parse_ledger;
use texdupe::restore::{restore_from_ledgers, RestoreError};

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_already_restored_line_is_skipped() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "tex/x.dds", b"present");

    let ledger = parse_ledger(";comment\ntex/x.dds\ttex/y.dds\n");
    let report = restore_from_ledgers(root, &[ledger]).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.skipped_existing, 1);
    assert_eq!(report.restored, 0);
    assert_eq!(fs::read(root.join("tex/x.dds")).unwrap(), b"present");
    assert!(!root.join("tex/y.dds").exists());
}

#[test]
fn test_chain_resolves_in_either_order() {
    for text in [
        "tex/a.dds\tb.dds\ntex/b.dds\tc.dds\n",
        "tex/b.dds\tc.dds\ntex/a.dds\tb.dds\n",
    ] {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "tex/c.dds", b"survivor");

        let report = restore_from_ledgers(root, &[parse_ledger(text)]).unwrap();

        assert!(report.is_complete(), "ledger order: {text:?}");
        assert_eq!(report.restored, 2);
        assert_eq!(report.chains, 1);
        assert_eq!(fs::read(root.join("tex/a.dds")).unwrap(), b"survivor");
        assert_eq!(fs::read(root.join("tex/b.dds")).unwrap(), b"survivor");
    }
}

#[test]
fn test_missing_target_left_unresolved() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "tex/keep.dds", b"k");

    let ledger = parse_ledger("tex/a.dds\tgone.dds\ntex/b.dds\tkeep.dds\n");
    let report = restore_from_ledgers(root, &[ledger]).unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.restored, 1);
    assert_eq!(report.unresolved.len(), 1);
    assert_eq!(report.unresolved[0].source(), "tex/a.dds");
    assert!(root.join("tex/b.dds").exists());
}

#[test]
fn test_restore_twice_is_idempotent() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "tex/a.dds", b"content");
    let ledger = parse_ledger("tex/b.dds\ta.dds\ntex/sub/c.dds\ta.dds\n");

    let first = restore_from_ledgers(root, std::slice::from_ref(&ledger)).unwrap();
    assert_eq!(first.restored, 2);
    assert!(root.join("tex/sub/c.dds").exists());

    let second = restore_from_ledgers(root, &[ledger]).unwrap();
    assert_eq!(second.restored, 0);
    assert_eq!(second.skipped_existing, 2);
    assert!(second.is_complete());
}

#[test]
fn test_cross_archive_targets_and_multiple_ledgers() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "arc1/x.dds", b"shared");

    let first = parse_ledger("arc2/y.dds\tarc1/x.dds\n");
    let second = parse_ledger("arc3/z.dds\tarc2/y.dds\n");
    let report = restore_from_ledgers(root, &[second, first]).unwrap();

    assert!(report.is_complete());
    assert_eq!(fs::read(root.join("arc2/y.dds")).unwrap(), b"shared");
    assert_eq!(fs::read(root.join("arc3/z.dds")).unwrap(), b"shared");
}

#[test]
fn test_case_insensitive_lookup_of_targets() {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root, "Tex/Sub/A.DDS", b"upper");

    let report = restore_from_ledgers(root, &[parse_ledger("tex/sub/b.dds\tsub/a.dds\n")]).unwrap();

    assert!(report.is_complete());
    assert_eq!(fs::read(root.join("Tex/Sub/b.dds")).unwrap(), b"upper");
}

#[test]
fn test_root_must_exist() {
    let dir = tempdir().unwrap();
    let result = restore_from_ledgers(&dir.path().join("missing"), &[]);
    assert!(matches!(result, Err(RestoreError::NotFound(_))));
}
