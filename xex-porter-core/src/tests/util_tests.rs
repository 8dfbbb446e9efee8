use std::path::PathBuf;

use super::*;

#[test]
fn sanitize_replaces_invalid_characters() {
    assert_eq!(sanitize_folder_name("Halo: Reach?"), "Halo_ Reach_");
    assert_eq!(sanitize_folder_name("a/b\\c|d*e"), "a_b_c_d_e");
}

#[test]
fn sanitize_bounds_length_and_trims() {
    let long = format!("{}   tail", "x".repeat(48));
    let sanitized = sanitize_folder_name(&long);
    assert!(sanitized.chars().count() <= MAX_FOLDER_NAME_CHARS);
    assert_eq!(sanitized, "x".repeat(48));
}

#[test]
fn sanitize_counts_characters_not_bytes() {
    let name = "é".repeat(60);
    assert_eq!(sanitize_folder_name(&name).chars().count(), MAX_FOLDER_NAME_CHARS);
}

#[test]
fn test_format_bytes_approx() {
    assert_eq!(format_bytes_approx(0), "0 B");
    assert_eq!(format_bytes_approx(512), "512 B");
    assert_eq!(format_bytes_approx(1536), "1.5 KB");
    assert_eq!(format_bytes_approx(1048576), "1.0 MB");
    assert_eq!(format_bytes_approx(7_516_192_768), "7.0 GB");
}

#[test]
fn forward_slashes_replace_backslashes() {
    let path = PathBuf::from(r"C:\games\default.xex");
    assert_eq!(to_forward_slashes(&path), "C:/games/default.xex");
}
