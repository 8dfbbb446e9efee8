use std::collections::BTreeMap;
use std::path::PathBuf;

use xex_porter_catalog::{CatalogEntry, GameStatus, PathField, StatusPatch};
use xex_porter_core::GameIdentity;
use xex_porter_db::*;

fn sample_identity() -> GameIdentity {
    GameIdentity {
        original_pe_name: "DeadToRights_xenon.exe".to_string(),
        title_id: "4E4D07F5".to_string(),
        media_id: "2D2E2EEB".to_string(),
        version: "v1.0.0.0".to_string(),
        regions: "0xFFFFFFFF".to_string(),
        esrb_rating: "ESRB_M".to_string(),
        entry_point: "0x82A1C4D8".to_string(),
        load_address: "0x82000000".to_string(),
        static_libraries: vec!["XMP 2.0.9328.0".to_string(), "XAPILIB 2.0.9328.0".to_string()],
        ..GameIdentity::default()
    }
}

#[test]
fn upsert_creates_then_updates() {
    let conn = open_memory().unwrap();
    let entry = CatalogEntry::new("11223344", "Sample");

    let first = upsert_game(&conn, &entry).unwrap();
    assert!(first.created);
    assert_eq!(first.id, 1);

    let mut again = CatalogEntry::new("11223344", "Sample");
    again.status = GameStatus::Completed;
    let second = upsert_game(&conn, &again).unwrap();
    assert!(!second.created);
    assert_eq!(second.id, 1);

    assert_eq!(count_games(&conn, None).unwrap(), 1);
    let stored = get_game(&conn, 1).unwrap().unwrap();
    assert_eq!(stored.status, GameStatus::Completed);
}

#[test]
fn upsert_is_idempotent() {
    let conn = open_memory().unwrap();
    let entry = CatalogEntry::from_identity(&sample_identity(), "Dead To Rights", GameStatus::Analysed);
    for _ in 0..5 {
        upsert_game(&conn, &entry).unwrap();
    }
    assert_eq!(count_games(&conn, None).unwrap(), 1);
}

#[test]
fn upsert_preserves_unset_fields() {
    let conn = open_memory().unwrap();
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.notes = Some("keep".to_string());
    entry.iso_path = Some("/isos/sample.iso".to_string());
    upsert_game(&conn, &entry).unwrap();

    let update = CatalogEntry::new("11223344", "Sample");
    upsert_game(&conn, &update).unwrap();

    let stored = get_game_by_title_id(&conn, "11223344").unwrap().unwrap();
    assert_eq!(stored.notes.as_deref(), Some("keep"));
    assert_eq!(stored.iso_path.as_deref(), Some("/isos/sample.iso"));
}

#[test]
fn upsert_overwrites_status_even_backwards() {
    let conn = open_memory().unwrap();
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.status = GameStatus::Completed;
    upsert_game(&conn, &entry).unwrap();

    entry.status = GameStatus::Pending;
    upsert_game(&conn, &entry).unwrap();

    let stored = get_game_by_title_id(&conn, "11223344").unwrap().unwrap();
    assert_eq!(stored.status, GameStatus::Pending);
}

#[test]
fn upsert_keeps_name_when_incoming_is_empty() {
    let conn = open_memory().unwrap();
    upsert_game(&conn, &CatalogEntry::new("11223344", "Sample")).unwrap();
    upsert_game(&conn, &CatalogEntry::new("11223344", "")).unwrap();
    let stored = get_game_by_title_id(&conn, "11223344").unwrap().unwrap();
    assert_eq!(stored.game_name, "Sample");

    upsert_game(&conn, &CatalogEntry::new("11223344", "Renamed")).unwrap();
    let stored = get_game_by_title_id(&conn, "11223344").unwrap().unwrap();
    assert_eq!(stored.game_name, "Renamed");
}

#[test]
fn entries_without_title_id_never_merge() {
    let conn = open_memory().unwrap();
    let a = upsert_game(&conn, &CatalogEntry::new("", "Unknown A")).unwrap();
    let b = upsert_game(&conn, &CatalogEntry::new("", "Unknown B")).unwrap();
    assert!(a.created && b.created);
    assert_ne!(a.id, b.id);
    assert_eq!(count_games(&conn, None).unwrap(), 2);

    let stored = get_game(&conn, a.id).unwrap().unwrap();
    assert_eq!(stored.title_id, "");
}

#[test]
fn identity_columns_round_trip() {
    let conn = open_memory().unwrap();
    let entry = CatalogEntry::from_identity(&sample_identity(), "Dead To Rights", GameStatus::Analysed);
    let outcome = upsert_game(&conn, &entry).unwrap();

    let stored = get_game(&conn, outcome.id).unwrap().unwrap();
    assert_eq!(stored.media_id.as_deref(), Some("2D2E2EEB"));
    assert_eq!(stored.original_pe_name.as_deref(), Some("DeadToRights_xenon.exe"));
    assert_eq!(stored.status, GameStatus::Analysed);
    assert!(!stored.created_at.is_empty());

    let info = stored.xex_info().unwrap();
    assert_eq!(info.static_libraries.len(), 2);
    assert_eq!(info.load_address, "0x82000000");
}

#[test]
fn insert_duplicate_title_id_fails() {
    let conn = open_memory().unwrap();
    insert_game(&conn, &CatalogEntry::new("11223344", "Sample")).unwrap();
    let result = insert_game(&conn, &CatalogEntry::new("11223344", "Sample"));
    assert!(matches!(result, Err(OperationError::Sqlite(_))));
}

#[test]
fn update_game_overwrites_everything() {
    let conn = open_memory().unwrap();
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.notes = Some("first".to_string());
    entry.id = insert_game(&conn, &entry).unwrap();

    entry.notes = None;
    entry.game_name = "Sample (Rev 2)".to_string();
    update_game(&conn, &entry).unwrap();

    let stored = get_game(&conn, entry.id).unwrap().unwrap();
    assert_eq!(stored.game_name, "Sample (Rev 2)");
    assert_eq!(stored.notes, None);
}

#[test]
fn update_game_missing_row_is_not_found() {
    let conn = open_memory().unwrap();
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.id = 42;
    let err = update_game(&conn, &entry).unwrap_err();
    assert!(matches!(err, OperationError::NotFound { .. }));
}

#[test]
fn update_status_applies_patch() {
    let conn = open_memory().unwrap();
    let id = insert_game(&conn, &CatalogEntry::new("11223344", "Sample")).unwrap();

    let patch = StatusPatch::new()
        .with_path(PathField::XexPath, "/ports/Sample [11223344]/default.xex")
        .with_notes("dumped from retail disc");
    assert!(update_status(&conn, id, GameStatus::Extracted, &patch).unwrap());

    let stored = get_game(&conn, id).unwrap().unwrap();
    assert_eq!(stored.status, GameStatus::Extracted);
    assert_eq!(stored.xex_path.as_deref(), Some("/ports/Sample [11223344]/default.xex"));
    assert_eq!(stored.notes.as_deref(), Some("dumped from retail disc"));
    assert_eq!(stored.iso_path, None);
}

#[test]
fn update_status_unknown_id_returns_false() {
    let conn = open_memory().unwrap();
    assert!(!update_status(&conn, 7, GameStatus::Failed, &StatusPatch::default()).unwrap());
}

#[test]
fn apply_paths_writes_only_given_fields() {
    let conn = open_memory().unwrap();
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.iso_path = Some("/isos/sample.iso".to_string());
    let id = insert_game(&conn, &entry).unwrap();

    let mut paths = BTreeMap::new();
    paths.insert(PathField::XexPath, PathBuf::from("/ports/x/default.xex"));
    paths.insert(PathField::AnalysisJson, PathBuf::from("/ports/x/analysis/analysis.json"));
    assert!(apply_paths(&conn, id, &paths).unwrap());

    let stored = get_game(&conn, id).unwrap().unwrap();
    assert_eq!(stored.xex_path.as_deref(), Some("/ports/x/default.xex"));
    assert_eq!(stored.analysis_json.as_deref(), Some("/ports/x/analysis/analysis.json"));
    assert_eq!(stored.iso_path.as_deref(), Some("/isos/sample.iso"));
}

#[test]
fn delete_game_removes_row() {
    let conn = open_memory().unwrap();
    let id = insert_game(&conn, &CatalogEntry::new("11223344", "Sample")).unwrap();
    assert!(delete_game(&conn, id).unwrap());
    assert!(!delete_game(&conn, id).unwrap());
    assert!(get_game(&conn, id).unwrap().is_none());
}
