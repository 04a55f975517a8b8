// End-to-end runs over the CSV fixtures in testdata/

use std::path::PathBuf;

use bird_taxonomy::{
    load_from_dir, open_sources, open_workbook, process_ioc_batch, read_sof, write_to_dir,
    Checklist, FileKind, TaxonomyError,
};
use tempfile::TempDir;

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

fn full_batch() -> Vec<PathBuf> {
    // Deliberately out of processing order
    vec![
        testdata("ioc-14.1-complementary"),
        testdata("ioc-14.1-master"),
        testdata("ioc-14.1-multilingual"),
    ]
}

#[test]
fn test_full_ioc_batch() {
    let tmp = TempDir::new().unwrap();
    let sources = open_sources(&full_batch()).unwrap();
    let kinds: Vec<FileKind> = sources.iter().map(|s| s.kind()).collect();
    assert_eq!(
        kinds,
        vec![FileKind::Master, FileKind::Multilingual, FileKind::Complementary]
    );

    let outcome = process_ioc_batch(sources, &tmp.path().join("ioc")).unwrap();
    let t = &outcome.taxonomy;

    let expected = "Taxonomy statistics:\n  Taxonomy: IOC 14.1\n  Infraclasses: 2\n  Orders: 2\n  Families: 2\n  Genus: 2\n  Species: 3\n  Subspecies: 3\n  Total number of taxa: 14\n";
    assert_eq!(t.info(), expected);

    // Multilingual
    let (kind, report) = outcome.merges[0];
    assert_eq!(kind, FileKind::Multilingual);
    assert_eq!((report.matched, report.unmatched), (3, 1));
    let raven = t.find("Corvus corax").unwrap();
    assert_eq!(raven.common_names["sv"], "korp");
    assert_eq!(raven.common_names["fr"], "Grand Corbeau");
    assert!(!t.find("Corvus corone").unwrap().common_names.contains_key("sv"));

    // Complementary, guarded to genus and below
    let (kind, report) = outcome.merges[1];
    assert_eq!(kind, FileKind::Complementary);
    assert_eq!((report.matched, report.updated, report.unmatched), (6, 4, 1));
    assert_eq!(raven.code.as_deref(), Some("NA"));
    assert_eq!(raven.extinct, Some(false));
    assert_eq!(t.find("STRUTHIONIFORMES").unwrap().code, None);
    let syriacus = t.find("Struthio camelus syriacus").unwrap();
    assert_eq!(syriacus.extinct, Some(true));
    assert_eq!(syriacus.supertaxon.as_deref(), Some("camelus"));
    assert_eq!(syriacus.comment.as_deref(), Some("Extinct c. 1966"));
}

#[test]
fn test_write_then_merge_into_stored_master() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("ioc");

    let master = open_sources(&[testdata("ioc-14.1-master")]).unwrap();
    let outcome = process_ioc_batch(master, &dir).unwrap();
    let written = write_to_dir(&outcome.taxonomy, &dir).unwrap();
    assert_eq!(written, 14);
    assert!(dir.join("Struthio_camelus_syriacus.json").exists());

    // Second run with only an auxiliary file picks up the stored master.
    let aux = open_sources(&[testdata("ioc-14.1-multilingual")]).unwrap();
    let merged = process_ioc_batch(aux, &dir).unwrap();
    assert_eq!(merged.taxonomy.total(), 14);
    assert_eq!(
        merged.taxonomy.find("Struthio camelus").unwrap().common_names["sv"],
        "struts"
    );

    // Writing again over the same directory is refused.
    assert!(matches!(
        write_to_dir(&merged.taxonomy, &dir),
        Err(TaxonomyError::DirectoryAlreadyExists(_))
    ));

    let reloaded = load_from_dir(&dir, Checklist::Ioc).unwrap();
    assert_eq!(
        serde_json::to_value(reloaded.nested()).unwrap(),
        serde_json::to_value(outcome.taxonomy.nested()).unwrap()
    );
}

#[test]
fn test_duplicate_kind_rejected() {
    let paths = vec![testdata("ioc-14.1-master"), testdata("ioc-14.1-master")];
    match open_sources(&paths) {
        Err(err @ TaxonomyError::DuplicateKind { .. }) => assert_eq!(err.exit_code(), 5),
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("duplicate master files accepted"),
    }
}

#[test]
fn test_unrecognized_file() {
    let err = open_sources(&[testdata("sof-2024")]).unwrap_err();
    assert!(matches!(err, TaxonomyError::UnrecognizedFileKind(_)));
}

#[test]
fn test_sof_names_list() {
    let workbook = open_workbook(&testdata("sof-2024")).unwrap();
    let t = read_sof(&workbook).unwrap();

    let expected = "Taxonomy statistics:\n  Taxonomy: SOF 2024\n  Orders: 2\n  Families: 2\n  Species: 4\n  Total number of taxa: 8\n";
    assert_eq!(t.info(), expected);

    let goose = t.find("Anser anser").unwrap();
    assert_eq!(goose.common_names["sv"], "Grågås");
    assert_eq!(
        goose.notes,
        vec!["Arten förekommer även som införd.", "Tamformen räknas inte."]
    );
    assert_eq!(goose.sort_index, Some(3));

    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("sof");
    write_to_dir(&t, &dir).unwrap();
    let reloaded = load_from_dir(&dir, Checklist::Sof).unwrap();
    assert_eq!(reloaded.counts(), t.counts());
    assert_eq!(reloaded.version(), "2024");
}
