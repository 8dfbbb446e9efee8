use std::path::Path;

/// Characters that are not allowed in folder names on common filesystems.
const INVALID_FOLDER_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Maximum length, in characters, of a sanitized folder name.
pub const MAX_FOLDER_NAME_CHARS: usize = 50;

/// Make a display name safe to use as a folder name.
///
/// Invalid characters become `_`, the result is cut to
/// [`MAX_FOLDER_NAME_CHARS`] characters and trimmed.
pub fn sanitize_folder_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if INVALID_FOLDER_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_FOLDER_NAME_CHARS)
        .collect();
    replaced.trim().to_string()
}

/// Format a byte count with fractional KB/MB (e.g., "1.5 KB", "2.3 MB").
pub fn format_bytes_approx(bytes: u64) -> String {
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Render a path with `/` separators, as the recompiler expects.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
#[path = "tests/util_tests.rs"]
mod tests;
