use std::collections::BTreeMap;
use std::path::PathBuf;

use xex_porter_catalog::*;
use xex_porter_core::GameIdentity;

#[test]
fn status_strings_round_trip() {
    for status in GameStatus::ALL {
        assert_eq!(GameStatus::from_str_loose(status.as_str()), status);
    }
}

#[test]
fn status_accepts_spelling_variants() {
    assert_eq!(GameStatus::from_str_loose("in-progress"), GameStatus::InProgress);
    assert_eq!(GameStatus::from_str_loose("Analyzed"), GameStatus::Analysed);
    assert_eq!(GameStatus::from_str_loose(" COMPLETED "), GameStatus::Completed);
}

#[test]
fn unknown_status_is_pending() {
    assert_eq!(GameStatus::from_str_loose("archived"), GameStatus::Pending);
    assert_eq!(GameStatus::from_str_loose(""), GameStatus::Pending);
    assert_eq!(GameStatus::parse("archived"), None);
}

#[test]
fn status_serializes_as_snake_case() {
    let json = serde_json::to_string(&GameStatus::InProgress).unwrap();
    assert_eq!(json, "\"in_progress\"");
}

#[test]
fn from_identity_maps_columns() {
    let identity = GameIdentity {
        original_pe_name: "DeadToRights_xenon.exe".to_string(),
        title_id: "4E4D07F5".to_string(),
        media_id: "2D2E2EEB".to_string(),
        disc_number: 2,
        total_discs: 3,
        load_address: "0x82000000".to_string(),
        static_libraries: (0..14).map(|i| format!("LIB{} 1.0", i)).collect(),
        ..GameIdentity::default()
    };

    let entry = CatalogEntry::from_identity(&identity, "Dead To Rights", GameStatus::Analysed);
    assert_eq!(entry.id, 0);
    assert_eq!(entry.title_id, "4E4D07F5");
    assert_eq!(entry.game_name, "Dead To Rights");
    assert_eq!(entry.status, GameStatus::Analysed);
    assert_eq!(entry.media_id.as_deref(), Some("2D2E2EEB"));
    assert_eq!(entry.disc_number, 2);
    assert_eq!(entry.total_discs, 3);
    // Empty identity strings stay unset
    assert_eq!(entry.version, None);
    assert_eq!(entry.regions, None);

    let info = entry.xex_info().unwrap();
    assert_eq!(info.static_libraries.len(), STORED_LIBRARY_LIMIT);
    assert_eq!(info.static_libraries[0], "LIB0 1.0");
    assert!(info.is_retail);
    assert!(info.is_encrypted);
    assert_eq!(info.load_address, "0x82000000");
}

#[test]
fn path_accessors_follow_field() {
    let mut entry = CatalogEntry::new("11223344", "Sample");
    for field in PathField::ALL {
        assert_eq!(entry.path(field), None);
        entry.set_path(field, Some(format!("/tmp/{}", field.column())));
    }
    assert_eq!(entry.path(PathField::IsoPath), Some("/tmp/iso_path"));
    assert_eq!(entry.xex_path.as_deref(), Some("/tmp/xex_path"));
    assert_eq!(entry.project_toml.as_deref(), Some("/tmp/project_toml"));

    entry.set_path(PathField::IsoPath, None);
    assert_eq!(entry.iso_path, None);
}

#[test]
fn apply_paths_only_touches_given_fields() {
    let mut entry = CatalogEntry::new("11223344", "Sample");
    entry.iso_path = Some("/isos/sample.iso".to_string());

    let mut paths = BTreeMap::new();
    paths.insert(PathField::XexPath, PathBuf::from("/ports/Sample [11223344]/default.xex"));
    entry.apply_paths(&paths);

    assert_eq!(entry.xex_path.as_deref(), Some("/ports/Sample [11223344]/default.xex"));
    assert_eq!(entry.iso_path.as_deref(), Some("/isos/sample.iso"));
}

#[test]
fn status_patch_columns() {
    assert!(StatusPatch::new().is_empty());

    let patch = StatusPatch::new()
        .with_path(PathField::IsoPath, "/isos/a.iso")
        .with_notes("n");
    assert_eq!(
        patch.columns(),
        vec![("iso_path", "/isos/a.iso"), ("notes", "n")]
    );
}
