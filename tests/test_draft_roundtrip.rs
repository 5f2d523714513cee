//! Draft codec round-trip and corruption tests, including the property
//! check over generated reports and the draft file helpers.

use std::io::Cursor;

use chrono::NaiveDate;
use proptest::prelude::*;
use reportcraft::{draft, Error, Field, Logo, Report, Section, SectionContent};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
}

fn png_logo() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 8, image::Rgb([255, 0, 0]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn full_report() -> Report {
    Report::new(
        "Annual Report",
        "Alice Writer",
        date(),
        vec![
            Section::fields(
                "Key Figures",
                vec![Field::new("Revenue", "1.2M"), Field::new("Margin", "14%")],
            ),
            Section::paragraphs(
                "Summary",
                vec!["A good year overall.".into(), "Next year looks better.".into()],
            ),
        ],
        Some(Logo::new(png_logo(), 3.5)),
    )
    .unwrap()
}

#[test]
fn round_trip_preserves_everything() {
    let report = full_report();
    let json = draft::serialize(&report).unwrap();
    let restored = draft::deserialize(&json).unwrap();

    assert_eq!(report, restored);
    // Logo bytes survive the base64 leg intact
    assert_eq!(restored.logo().unwrap().data, png_logo());
}

#[test]
fn serialization_is_deterministic() {
    let report = full_report();
    assert_eq!(draft::serialize(&report).unwrap(), draft::serialize(&report).unwrap());
}

#[test]
fn newer_version_rejected_as_corrupt() {
    let json = draft::serialize(&full_report())
        .unwrap()
        .replace("\"version\": 1", "\"version\": 99");
    match draft::deserialize(&json) {
        Err(Error::DraftCorrupt(reason)) => assert!(reason.contains("99")),
        other => panic!("expected DraftCorrupt, got {other:?}"),
    }
}

#[test]
fn older_version_rejected_as_corrupt() {
    let json = draft::serialize(&full_report())
        .unwrap()
        .replace("\"version\": 1", "\"version\": 0");
    assert!(matches!(draft::deserialize(&json), Err(Error::DraftCorrupt(_))));
}

#[test]
fn truncated_draft_rejected() {
    let json = draft::serialize(&full_report()).unwrap();
    let truncated = &json[..json.len() / 2];
    assert!(matches!(draft::deserialize(truncated), Err(Error::DraftCorrupt(_))));
}

#[test]
fn invalid_report_inside_valid_json_fails_validation() {
    let json = r#"{
        "version": 1,
        "title": "Valid Title",
        "author": "",
        "date": "2024-03-31",
        "sections": [{"heading": "", "kind": "paragraphs", "paragraphs": []}]
    }"#;
    assert!(matches!(draft::deserialize(json), Err(Error::Validation { .. })));
}

#[test]
fn draft_files_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("annual.json");

    let report = full_report();
    draft::save_to(&report, &path).unwrap();
    assert_eq!(draft::load_from(&path).unwrap(), report);

    let drafts = draft::list_drafts(dir.path()).unwrap();
    assert_eq!(drafts, vec![path]);
}

#[test]
fn missing_draft_file_is_io_error() {
    assert!(matches!(
        draft::load_from("/nonexistent/draft.json"),
        Err(Error::Io(_))
    ));
}

#[test]
fn report_codes_increment_per_directory() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(draft::next_report_code(dir.path(), "RPT").unwrap(), "RPT001");
    assert_eq!(draft::next_report_code(dir.path(), "RPT").unwrap(), "RPT002");
    assert_eq!(draft::next_report_code(dir.path(), "OTHER").unwrap(), "OTHER003");
}

// === Property: deserialize(serialize(r)) == r ===

fn arb_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,;:!()*_\\[\\]#-]{0,24}"
}

fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9 ]{0,16}"
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2000i32..2100, 1u32..13, 1u32..29)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_section() -> impl Strategy<Value = Section> {
    let fields = proptest::collection::vec(
        (arb_text(), arb_text()).prop_map(|(label, value)| Field::new(label, value)),
        0..4,
    )
    .prop_map(SectionContent::Fields);
    let paragraphs =
        proptest::collection::vec(arb_text(), 0..4).prop_map(SectionContent::Paragraphs);

    (arb_title(), prop_oneof![fields, paragraphs])
        .prop_map(|(heading, content)| Section { heading, content })
}

fn arb_report() -> impl Strategy<Value = Report> {
    (
        arb_title(),
        arb_text(),
        arb_date(),
        proptest::collection::vec(arb_section(), 0..5),
        proptest::option::of(0.5f64..12.0),
    )
        .prop_map(|(title, author, date, sections, logo_width)| {
            let logo = logo_width.map(|width_cm| Logo::new(png_logo(), width_cm));
            Report::new(title, author, date, sections, logo).unwrap()
        })
}

proptest! {
    #[test]
    fn prop_round_trip(report in arb_report()) {
        let json = draft::serialize(&report).unwrap();
        let restored = draft::deserialize(&json).unwrap();
        prop_assert_eq!(report, restored);
    }
}
