mod common;

use std::fs;

use assert_matches::assert_matches;

use dmid_explorer::domain::StudyId;
use dmid_explorer::error::ExplorerError;
use dmid_explorer::report::{REPORT_UNAVAILABLE, ReportStore, ReportText};

use common::Dataset;

#[test]
fn report_text_is_returned_verbatim() {
    let dataset = Dataset::new();
    let text = "FINDINGS:\n  Scattered fibroglandular densities.\n";
    dataset.report(4, text);

    let store = ReportStore::new(dataset.layout.reports_dir());
    let report = store.load(StudyId::new(4)).unwrap();
    assert!(report.is_available());
    assert_eq!(report.as_str(), text);
}

#[test]
fn absent_report_is_the_sentinel() {
    let dataset = Dataset::new();
    let store = ReportStore::new(dataset.layout.reports_dir());
    let report = store.load(StudyId::new(9)).unwrap();
    assert_eq!(report, ReportText::Unavailable);
    assert_eq!(report.as_str(), "No report available.");
    assert_eq!(REPORT_UNAVAILABLE, "No report available.");
    assert_eq!(String::from(report), "No report available.");
}

#[test]
fn report_file_name_uses_mixed_case() {
    let dataset = Dataset::new();
    let store = ReportStore::new(dataset.layout.reports_dir());
    let path = store.report_path(StudyId::new(12));
    assert_eq!(path.file_name(), Some("Img012.txt"));
}

#[test]
fn unreadable_report_is_an_error() {
    let dataset = Dataset::new();
    let store = ReportStore::new(dataset.layout.reports_dir());
    fs::create_dir(store.report_path(StudyId::new(3))).unwrap();
    assert_matches!(
        store.load(StudyId::new(3)),
        Err(ExplorerError::ReportRead { .. })
    );

    fs::write(store.report_path(StudyId::new(5)), [0xff, 0xfe, 0x00]).unwrap();
    assert_matches!(
        store.load(StudyId::new(5)),
        Err(ExplorerError::ReportRead { .. })
    );
}
