use super::*;

const SAMPLE_REPORT: &str = "\
XEX Info
  Retail
  Compressed
  Encrypted
  Title Module

Basefile Info
  Original PE Name:   DeadToRights_xenon.exe
  Load Address:       82000000
  Entry Point:        82B4C0A8
  Image Size:         01A40000

Execution Id
  Media Id:           2D2E2EEB
  Title Id:           4E4D07F5  (NM-2037)
  Savegame Id:        4E4D07F5
  Version:            v1.0.0.0
  Base Version:       v0.0.0.0
  Disc Number:        1
  Number of Discs:    2

Regions
  0xFFFFFFFF

Game Ratings
  ESRB:      ESRB_M            08
  PEGI:      PEGI_16           09
  PEGI:      PEGI_18           10

Static Libraries
  0) XAPILIB        v2.0.6534.0
  1) D3DX9          v2.0.6534.0
  2) XMP            v2.0.9328.0
";

#[test]
fn parses_full_sample_report() {
    let parsed = parse_identity_report(SAMPLE_REPORT);
    let id = &parsed.identity;

    assert_eq!(id.original_pe_name, "DeadToRights_xenon.exe");
    assert_eq!(id.load_address, "82000000");
    assert_eq!(id.entry_point, "82B4C0A8");
    assert_eq!(id.image_size, "01A40000");
    assert_eq!(id.media_id, "2D2E2EEB");
    assert_eq!(id.title_id, "4E4D07F5");
    assert_eq!(id.version, "v1.0.0.0");
    assert_eq!(id.base_version, "v0.0.0.0");
    assert_eq!(id.disc_number, 1);
    assert_eq!(id.total_discs, 2);
    assert_eq!(id.regions, "0xFFFFFFFF");
    assert_eq!(id.esrb_rating, "ESRB_M");
    assert_eq!(id.pegi_rating, "PEGI_16");
    assert!(id.is_retail);
    assert!(id.is_compressed);
    assert!(id.is_encrypted);
    assert_eq!(
        id.static_libraries,
        vec!["XAPILIB 2.0.6534.0", "D3DX9 2.0.6534.0", "XMP 2.0.9328.0"]
    );
    assert_eq!(parsed.title_id(), Some("4E4D07F5"));
    assert_eq!(id.display_name(), "Dead To Rights");
}

#[test]
fn empty_report_resolves_nothing() {
    let parsed = parse_identity_report("");
    assert!(parsed.resolved.is_empty());
    assert_eq!(parsed.identity, GameIdentity::default());
}

#[test]
fn garbage_report_never_fails() {
    let parsed = parse_identity_report("::::\n)\n0)\n\u{0}\u{1}binary junk\nRegions");
    assert_eq!(parsed.title_id(), None);
    assert!(parsed.identity.static_libraries.is_empty());
    assert!(!parsed.is_resolved(IdentityField::Regions));
}

#[test]
fn title_id_outside_execution_block_is_ignored() {
    let report = "Title Id: 4E4D07F5\nMedia Id: 2D2E2EEB\n";
    let parsed = parse_identity_report(report);
    assert_eq!(parsed.title_id(), None);
    assert!(!parsed.is_resolved(IdentityField::MediaId));
}

#[test]
fn title_id_too_far_from_marker_is_ignored() {
    let report = "Execution Id\n a\n b\n c\n d\n e\n Title Id: 11223344\n";
    let parsed = parse_identity_report(report);
    assert_eq!(parsed.title_id(), None);
}

#[test]
fn title_id_at_edge_of_window_is_accepted() {
    let report = "Execution Id\n a\n b\n c\n d\n Title Id: 11223344\n";
    let parsed = parse_identity_report(report);
    assert_eq!(parsed.title_id(), Some("11223344"));
}

#[test]
fn title_id_without_hex_prefix_is_unresolved() {
    let parsed = parse_identity_report("Execution Id\n Title Id: (none)\n");
    assert!(!parsed.is_resolved(IdentityField::TitleId));
}

#[test]
fn non_numeric_disc_fields_fall_back_to_one() {
    let parsed = parse_identity_report("Disc Number: two\nNumber of Discs: ?\n");
    assert_eq!(parsed.identity.disc_number, 1);
    assert_eq!(parsed.identity.total_discs, 1);
    assert!(!parsed.is_resolved(IdentityField::DiscNumber));
}

#[test]
fn regions_value_comes_from_following_line() {
    let parsed = parse_identity_report("Regions\n   0x000000FF  \nOther: x");
    assert_eq!(parsed.identity.regions, "0x000000FF");
}

#[test]
fn devkit_and_unencrypted_flags_override_defaults() {
    let parsed = parse_identity_report("Devkit\nUnencrypted\nUncompressed\n");
    assert!(!parsed.identity.is_retail);
    assert!(!parsed.identity.is_encrypted);
    assert!(!parsed.identity.is_compressed);
    assert!(parsed.is_resolved(IdentityField::EncryptionFlag));
}

#[test]
fn static_libraries_keep_report_order_and_need_two_tokens() {
    let report = "  10) ZLIB v1.2\n  2) XAUD 2.0\n  3) LONELY\n  x) NOPE v1\n";
    let parsed = parse_identity_report(report);
    assert_eq!(parsed.identity.static_libraries, vec!["ZLIB 1.2", "XAUD 2.0"]);
}

#[test]
fn handles_crlf_line_endings() {
    let report = "Execution Id\r\n  Title Id: 11223344\r\n  Version: v2.0\r\n";
    let parsed = parse_identity_report(report);
    assert_eq!(parsed.title_id(), Some("11223344"));
    assert_eq!(parsed.identity.version, "v2.0");
}
