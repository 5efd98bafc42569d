//! End-to-end tests over the bibliographies in `test-data/`: load, combine,
//! deduplicate, write.

use std::path::{Path, PathBuf};
use thesis_bib::{
    DatabaseMerger, Deduplicator, DuplicateReport, Error, RecordCollection, RenameMap,
    SimilarityEngine,
};

fn test_data(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(relative)
}

fn load_chapters() -> Vec<RecordCollection> {
    ["chapterA/references.bib", "chapterB/references.bib"]
        .iter()
        .map(|p| RecordCollection::from_path(test_data(p)).unwrap())
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_keeps_header_and_comment_in_preamble() {
    let collection = RecordCollection::from_path(test_data("chapterA/references.bib")).unwrap();
    assert_eq!(collection.len(), 3);
    assert_eq!(collection.preamble().len(), 2);
    assert!(collection.preamble()[0].starts_with("% Bibliography for chapter A"));
    assert!(collection.preamble()[1].starts_with("@Comment{jabref-meta"));
    assert!(collection.display_name().ends_with("references.bib"));
}

#[test]
fn test_load_normalizes_author_initials() {
    let collection = RecordCollection::from_path(test_data("chapterB/references.bib")).unwrap();
    let smith = collection.get("Smith2018").unwrap();
    assert_eq!(smith.field("author"), Some("Smith, A. B."));
    assert_eq!(smith.field("title"), Some("On {RNA}, again"));
    assert_eq!(smith.field("year"), Some("2018"));
}

#[test]
fn test_malformed_file_names_path() {
    let err = RecordCollection::from_path(test_data("broken.bib")).unwrap_err();
    match &err {
        Error::MalformedRecord { fragment, path } => {
            assert!(fragment.starts_with("book{broken"), "Got: {}", fragment);
            assert!(path.as_ref().unwrap().ends_with("broken.bib"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    let text = err.to_diagnostic().to_text();
    assert!(text.starts_with("Error [T-1-1]"), "Got: {}", text);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RecordCollection::from_path(test_data("nope.bib")).unwrap_err();
    assert!(matches!(err, Error::Io { action: "read", .. }));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("T-1-5"));
}

// ============================================================================
// Combine + deduplicate
// ============================================================================

#[test]
fn test_combine_then_merge_all() {
    let engine = SimilarityEngine::default();
    let mut outcome = DatabaseMerger::new(&engine).combine_all(load_chapters());

    let keys: Vec<&str> = outcome.collection.keys().collect();
    assert_eq!(
        keys,
        vec![
            "LeCun2015",
            "shared",
            "goodfellow",
            "lecun_deep_2015",
            "sharedCopy1",
            "Smith2018"
        ]
    );
    assert_eq!(outcome.renames.get("shared"), Some("sharedCopy1"));
    assert_eq!(outcome.warnings().count(), 1);

    let renames = Deduplicator::new(&engine)
        .merge_all(&mut outcome.collection)
        .unwrap();

    let keys: Vec<&str> = outcome.collection.keys().collect();
    assert_eq!(
        keys,
        vec!["LeCun2015", "shared", "goodfellow", "sharedCopy1", "Smith2018"]
    );
    assert_eq!(renames.get("lecun_deep_2015"), Some("LeCun2015"));
    assert_eq!(renames.len(), 1);

    let lecun = outcome.collection.get("LeCun2015").unwrap();
    assert_eq!(lecun.field("title"), Some("Deep Learning"));
    assert_eq!(lecun.field("doi"), Some("10.1038/nature14539"));
    assert_eq!(lecun.field("volume"), Some("521"));
}

#[test]
fn test_written_collection_reloads_identically() {
    let engine = SimilarityEngine::default();
    let outcome = DatabaseMerger::new(&engine).combine_all(load_chapters());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("merged.bib");
    outcome.collection.write(&path).unwrap();

    let reloaded = RecordCollection::from_path(&path).unwrap();
    assert_eq!(reloaded, outcome.collection);
    assert_eq!(reloaded.to_text(), outcome.collection.to_text());
}

#[test]
fn test_rename_maps_chain_through_json() {
    let engine = SimilarityEngine::default();
    let mut outcome = DatabaseMerger::new(&engine).combine_all(load_chapters());
    let mut renames = outcome.renames.clone();
    renames.extend(
        &Deduplicator::new(&engine)
            .merge_all(&mut outcome.collection)
            .unwrap(),
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("renames.json");
    renames.write_json(&path).unwrap();
    let loaded = RenameMap::from_json_path(&path).unwrap();

    assert_eq!(loaded.resolve("lecun_deep_2015"), "LeCun2015");
    assert_eq!(loaded.resolve("shared"), "sharedCopy1");
    assert_eq!(loaded.resolve("goodfellow"), "goodfellow");
}

#[test]
fn test_report_over_combined_collection() {
    let engine = SimilarityEngine::default();
    let outcome = DatabaseMerger::new(&engine).combine_all(load_chapters());
    let report = DuplicateReport::build(&outcome.collection, &engine);

    assert_eq!(report.duplicates.len(), 1);
    assert_eq!(report.duplicates[0].keys, vec!["LeCun2015", "lecun_deep_2015"]);
}
