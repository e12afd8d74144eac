mod common;

use std::path::PathBuf;

use common::{every_page_has_media_box, page_labels, write_labelled_page};
use rmcloud2pdf::contract::DocumentMerger;
use rmcloud2pdf::merge::{merge_documents, LopdfMerger, MergeError};
use tempfile::tempdir;

#[test]
fn merges_pages_in_input_order() {
    let tmp = tempdir().unwrap();
    let inputs: Vec<PathBuf> = ["c", "a", "b"]
        .iter()
        .map(|label| {
            let path = tmp.path().join(format!("{label}.pdf"));
            write_labelled_page(&path, label);
            path
        })
        .collect();
    let dest = tmp.path().join("merged.pdf");

    LopdfMerger.merge(&inputs, &dest).expect("merge should succeed");

    assert_eq!(page_labels(&dest), vec!["c", "a", "b"]);
    assert!(every_page_has_media_box(&dest));
}

#[test]
fn overwrites_existing_destination() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("only.pdf");
    write_labelled_page(&page, "only");
    let dest = tmp.path().join("out.pdf");
    std::fs::write(&dest, b"stale contents").unwrap();

    merge_documents(&[page], &dest).unwrap();

    assert_eq!(page_labels(&dest), vec!["only"]);
}

#[test]
fn empty_input_is_rejected() {
    let tmp = tempdir().unwrap();
    let err = merge_documents(&[], &tmp.path().join("out.pdf")).unwrap_err();
    assert!(matches!(err, MergeError::NoInput));
}

#[test]
fn unreadable_page_is_reported() {
    let tmp = tempdir().unwrap();
    let good = tmp.path().join("good.pdf");
    write_labelled_page(&good, "good");
    let bad = tmp.path().join("bad.pdf");
    std::fs::write(&bad, b"this is not a pdf").unwrap();

    let err = merge_documents(&[good, bad.clone()], &tmp.path().join("out.pdf")).unwrap_err();
    match err {
        MergeError::Load { path, .. } => assert_eq!(path, bad),
        other => panic!("expected load error, got {other:?}"),
    }
}

#[test]
fn unwritable_destination_is_reported() {
    let tmp = tempdir().unwrap();
    let page = tmp.path().join("p.pdf");
    write_labelled_page(&page, "p");
    let dest = tmp.path().join("missing-dir").join("out.pdf");

    let err = merge_documents(&[page], &dest).unwrap_err();
    assert!(matches!(err, MergeError::Write { .. }));
}
