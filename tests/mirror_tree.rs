use std::collections::BTreeSet;
use std::path::Path;

use rmcloud2pdf::listing::RemotePath;
use rmcloud2pdf::mirror::{mirror_tree, MirrorError};
use tempfile::tempdir;
use walkdir::WalkDir;

fn snapshot(root: &Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .map(|e| e.path().strip_prefix(root).unwrap().display().to_string())
        .collect()
}

#[test]
fn creates_directories_with_missing_ancestors() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("out");
    let dirs = vec![RemotePath::new("/Notes"), RemotePath::new("/Deep/Er/Est")];

    let report = mirror_tree(&root, &dirs).expect("mirror should succeed");

    assert!(root.join("Notes").is_dir());
    assert!(root.join("Deep/Er/Est").is_dir());
    assert_eq!(report.created.len(), 2);
    assert!(report.failed.is_empty());
}

#[test]
fn mirroring_twice_is_idempotent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    let dirs = vec![
        RemotePath::new("/A"),
        RemotePath::new("/A/B"),
        RemotePath::new("/C"),
    ];

    mirror_tree(&root, &dirs).expect("first run");
    let first = snapshot(&root);
    let second_report = mirror_tree(&root, &dirs).expect("second run");

    assert!(second_report.failed.is_empty());
    assert_eq!(first, snapshot(&root));
}

#[test]
fn one_bad_directory_does_not_stop_the_rest() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    // A plain file where a directory is expected.
    std::fs::write(root.join("Blocked"), b"not a dir").unwrap();
    let dirs = vec![
        RemotePath::new("/Blocked/Child"),
        RemotePath::new("/Fine"),
    ];

    let report = mirror_tree(&root, &dirs).expect("root exists, run continues");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, RemotePath::new("/Blocked/Child"));
    assert!(root.join("Fine").is_dir());
}

#[test]
fn unusable_root_is_fatal() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("file-not-dir");
    std::fs::write(&root, b"x").unwrap();

    let err = mirror_tree(&root, &[RemotePath::new("/A")]).unwrap_err();
    assert!(matches!(err, MirrorError::Root { .. }));
}
