use super::*;
use crate::store::{FailingStore, MemoryStore};

// =============================================================
// Helpers
// =============================================================

fn id(raw: &str) -> ImageId {
    ImageId::parse(raw).unwrap()
}

fn records(entries: &[(&str, &str)]) -> Records<MemoryStore> {
    Records::new(MemoryStore::with_entries(entries.iter().copied()), KeyScheme::default())
}

fn raw(records: &Records<MemoryStore>, key: &str) -> Option<String> {
    records.store().get(key).unwrap()
}

// =============================================================
// parse_position
// =============================================================

#[test]
fn parse_accepts_numeric_left_top() {
    assert_eq!(parse_position(r#"{"left":12.5,"top":-3}"#), Ok(Position::new(12.5, -3.0)));
}

#[test]
fn parse_ignores_extra_fields() {
    assert_eq!(parse_position(r#"{"left":1,"top":2,"z":9}"#), Ok(Position::new(1.0, 2.0)));
}

#[test]
fn parse_rejects_malformed_records() {
    for raw in [
        "not json",
        "",
        "null",
        "42",
        r#""{\"left\":1,\"top\":2}""#,
        r#"{"left":1}"#,
        r#"{"top":1}"#,
        r#"{"left":"1","top":2}"#,
        r#"{"left":null,"top":2}"#,
        r#"{"left":1,"top":true}"#,
        r#"{"left":1e999,"top":2}"#,
    ] {
        assert!(parse_position(raw).is_err(), "expected {raw:?} to be rejected");
    }
}

// =============================================================
// Image Records
// =============================================================

#[test]
fn image_record_is_json_string() {
    let mut records = records(&[]);
    records.save_image(&id("abc123"), "data:image/png;base64,AAAA").unwrap();
    assert_eq!(
        raw(&records, "rhein-img-key-abc123"),
        Some(r#""data:image/png;base64,AAAA""#.to_owned())
    );
    assert_eq!(records.load_image(&id("abc123")).unwrap(), Some("data:image/png;base64,AAAA".to_owned()));
    assert!(records.has_image(&id("abc123")).unwrap());
}

#[test]
fn load_missing_image_is_none() {
    let records = records(&[]);
    assert_eq!(records.load_image(&id("abc123")).unwrap(), None);
    assert!(!records.has_image(&id("abc123")).unwrap());
}

#[test]
fn load_non_string_image_is_json_error() {
    let records = records(&[("rhein-img-key-abc123", "data:image/png;base64,AAAA")]);
    assert!(matches!(records.load_image(&id("abc123")), Err(RecordError::Json(_))));
}

// =============================================================
// Position Records
// =============================================================

#[test]
fn save_then_load_position_round_trips() {
    let mut records = records(&[]);
    records.save_position(&id("abc123"), Position::new(120.0, 340.0)).unwrap();
    assert_eq!(
        records.load_position(&id("abc123")).unwrap(),
        PositionLookup::Found(Position::new(120.0, 340.0))
    );
}

#[test]
fn save_invalid_position_leaves_previous_value() {
    let mut records = records(&[("rhein-img-position-abc123", r#"{"left":5,"top":6}"#)]);
    let err = records.save_position(&id("abc123"), Position::new(f64::NAN, 1.0));
    assert!(matches!(err, Err(RecordError::InvalidPosition { .. })));
    assert_eq!(raw(&records, "rhein-img-position-abc123"), Some(r#"{"left":5,"top":6}"#.to_owned()));
}

#[test]
fn save_invalid_position_writes_nothing_when_absent() {
    let mut records = records(&[]);
    assert!(records.save_position(&id("abc123"), Position::new(0.0, f64::INFINITY)).is_err());
    assert!(records.store().is_empty());
}

#[test]
fn load_position_missing_and_corrupt() {
    let records = records(&[("rhein-img-position-bad", "{")]);
    assert_eq!(records.load_position(&id("none")).unwrap(), PositionLookup::Missing);
    assert!(matches!(records.load_position(&id("bad")).unwrap(), PositionLookup::Corrupt(_)));
}

#[test]
fn lookup_or_origin() {
    assert_eq!(PositionLookup::Found(Position::new(1.0, 2.0)).or_origin(), Position::new(1.0, 2.0));
    assert_eq!(PositionLookup::Missing.or_origin(), Position::ORIGIN);
    assert_eq!(PositionLookup::Corrupt("x".to_owned()).or_origin(), Position::ORIGIN);
}

// =============================================================
// Removal
// =============================================================

#[test]
fn remove_deletes_both_records_only() {
    let mut records = records(&[
        ("rhein-img-key-abc123", r#""data:a""#),
        ("rhein-img-position-abc123", r#"{"left":1,"top":2}"#),
        ("rhein-img-key-zzz999", r#""data:b""#),
    ]);
    records.remove(&id("abc123")).unwrap();
    assert_eq!(records.store().keys().unwrap(), vec!["rhein-img-key-zzz999".to_owned()]);
}

// =============================================================
// Integrity pass
// =============================================================

#[test]
fn integrity_pass_removes_exactly_the_corrupt_positions() {
    let mut records = records(&[
        ("rhein-img-position-good01", r#"{"left":1,"top":2}"#),
        ("rhein-img-position-bad001", "not json"),
        ("rhein-img-position-bad002", r#"{"left":"x","top":2}"#),
        ("rhein-img-position-good02", r#"{"left":0,"top":0}"#),
        ("rhein-img-position-bad003", r#"{"top":2}"#),
        ("rhein-img-key-bad001", r#""data:a""#),
        ("unrelated", "not json"),
    ]);
    let report = records.integrity_pass().unwrap();
    assert_eq!(report.scanned, 5);
    assert_eq!(
        report.removed,
        vec![
            "rhein-img-position-bad001".to_owned(),
            "rhein-img-position-bad002".to_owned(),
            "rhein-img-position-bad003".to_owned(),
        ]
    );
    assert_eq!(
        records.store().keys().unwrap(),
        vec![
            "rhein-img-position-good01".to_owned(),
            "rhein-img-position-good02".to_owned(),
            "rhein-img-key-bad001".to_owned(),
            "unrelated".to_owned(),
        ]
    );
}

#[test]
fn integrity_pass_handles_adjacent_corrupt_keys() {
    let mut records = records(&[
        ("rhein-img-position-a", "x"),
        ("rhein-img-position-b", "y"),
        ("rhein-img-position-c", "z"),
    ]);
    let report = records.integrity_pass().unwrap();
    assert_eq!(report.removed.len(), 3);
    assert!(records.store().is_empty());
}

#[test]
fn integrity_pass_continues_after_failed_removal() {
    let mut store = FailingStore::over(&[
        ("rhein-img-position-aaa111", "not json"),
        ("rhein-img-position-bbb222", "not json"),
    ]);
    store.fail_remove.push("rhein-img-position-aaa111".to_owned());
    let mut records = Records::new(store, KeyScheme::default());

    let report = records.integrity_pass().unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.removed, vec!["rhein-img-position-bbb222".to_owned()]);
    assert_eq!(records.store().inner.keys().unwrap(), vec!["rhein-img-position-aaa111".to_owned()]);
}

#[test]
fn integrity_pass_skips_unreadable_positions() {
    let mut store = FailingStore::over(&[
        ("rhein-img-position-aaa111", "not json"),
        ("rhein-img-position-bbb222", "not json"),
    ]);
    store.fail_get.push("rhein-img-position-aaa111".to_owned());
    let mut records = Records::new(store, KeyScheme::default());

    let report = records.integrity_pass().unwrap();
    assert_eq!(report.removed, vec!["rhein-img-position-bbb222".to_owned()]);
}

#[test]
fn integrity_pass_on_clean_store_removes_nothing() {
    let mut records = records(&[("rhein-img-position-a", r#"{"left":1,"top":1}"#)]);
    assert_eq!(records.integrity_pass().unwrap(), IntegrityReport { scanned: 1, removed: Vec::new() });
}

// =============================================================
// load_all
// =============================================================

#[test]
fn load_all_places_images_at_stored_positions_in_order() {
    let mut records = records(&[
        ("rhein-img-key-bbb222", r#""data:b""#),
        ("rhein-img-position-aaa111", r#"{"left":10,"top":20}"#),
        ("rhein-img-key-aaa111", r#""data:a""#),
        ("rhein-img-position-bbb222", r#"{"left":30,"top":40}"#),
    ]);
    let images = records.load_all().unwrap();
    assert_eq!(
        images,
        vec![
            StoredImage { id: id("bbb222"), data_url: "data:b".to_owned(), position: Position::new(30.0, 40.0) },
            StoredImage { id: id("aaa111"), data_url: "data:a".to_owned(), position: Position::new(10.0, 20.0) },
        ]
    );
}

#[test]
fn load_all_defaults_missing_position_to_origin() {
    let mut records = records(&[("rhein-img-key-abc123", r#""data:a""#)]);
    let images = records.load_all().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].position, Position::ORIGIN);
}

#[test]
fn load_all_prunes_corrupt_position_and_keeps_image_at_origin() {
    let mut records = records(&[
        ("rhein-img-key-abc123", r#""data:image/png;base64,AAAA""#),
        ("rhein-img-position-abc123", "not json"),
    ]);
    let images = records.load_all().unwrap();
    assert_eq!(raw(&records, "rhein-img-position-abc123"), None);
    assert!(raw(&records, "rhein-img-key-abc123").is_some());
    assert_eq!(
        images,
        vec![StoredImage {
            id: id("abc123"),
            data_url: "data:image/png;base64,AAAA".to_owned(),
            position: Position::ORIGIN,
        }]
    );
}

#[test]
fn load_all_skips_undecodable_images_and_leaves_them_stored() {
    let mut records = records(&[
        ("rhein-img-key-broken", "data:not-json"),
        ("rhein-img-key-fine", r#""data:ok""#),
    ]);
    let images = records.load_all().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, id("fine"));
    assert!(raw(&records, "rhein-img-key-broken").is_some());
}

#[test]
fn load_all_ignores_keys_with_invalid_ids() {
    let mut records = records(&[("rhein-img-key-", r#""data:a""#), ("rhein-img-key-A-B", r#""data:b""#)]);
    assert!(records.load_all().unwrap().is_empty());
}

#[test]
fn load_all_survives_unreadable_position() {
    let mut store = FailingStore::over(&[
        ("rhein-img-key-aaa111", r#""data:a""#),
        ("rhein-img-position-aaa111", r#"{"left":10,"top":20}"#),
        ("rhein-img-key-bbb222", r#""data:b""#),
        ("rhein-img-position-bbb222", r#"{"left":30,"top":40}"#),
    ]);
    store.fail_get.push("rhein-img-position-bbb222".to_owned());
    let mut records = Records::new(store, KeyScheme::default());

    let images = records.load_all().unwrap();
    assert_eq!(
        images,
        vec![
            StoredImage { id: id("aaa111"), data_url: "data:a".to_owned(), position: Position::new(10.0, 20.0) },
            StoredImage { id: id("bbb222"), data_url: "data:b".to_owned(), position: Position::ORIGIN },
        ]
    );
    assert!(records.store().inner.get("rhein-img-position-bbb222").unwrap().is_some());
}

#[test]
fn load_all_skips_unreadable_image() {
    let mut store = FailingStore::over(&[("rhein-img-key-aaa111", r#""data:a""#), ("rhein-img-key-bbb222", r#""data:b""#)]);
    store.fail_get.push("rhein-img-key-aaa111".to_owned());
    let mut records = Records::new(store, KeyScheme::default());

    let images = records.load_all().unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].id, id("bbb222"));
}
