//! Parser for the identity report printed by the binary inspection tool.
//!
//! The report is free text meant for humans, so it is treated as a
//! versionless protocol: every line is matched against a table of known
//! prefixes, unknown lines are skipped, and nothing here ever fails.
//!
//! ```text
//! Original PE Name:  DeadToRights_xenon.exe
//! Execution Id
//!     Media Id:      2D2E2EEB
//!     Title Id:      4E4D07F5  (NM-2037)
//!     Version:       v1.0.0.0
//! Regions
//!     0xFFFFFFFF
//! ESRB:      ESRB_M            08
//!   0) XMP            v2.0.9328.0
//! ```

use crate::identity::{GameIdentity, IdentityField, ParsedIdentity};

/// How many lines after an `Execution Id` marker its fields are accepted.
pub const EXECUTION_ID_WINDOW: usize = 5;

const EXECUTION_ID_MARKER: &str = "Execution Id";

/// How a matched line yields its value.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Text after the first colon.
    Value,
    /// Text after the first colon, only near an `Execution Id` marker.
    ExecutionScoped,
    /// Integer after the first colon, falling back to 1.
    Number,
    /// The whole following line.
    NextLine,
    /// Second whitespace-separated token of the line.
    SecondToken,
}

const PREFIXES: &[(&str, IdentityField, Rule)] = &[
    ("Original PE Name:", IdentityField::OriginalPeName, Rule::Value),
    ("Load Address:", IdentityField::LoadAddress, Rule::Value),
    ("Entry Point:", IdentityField::EntryPoint, Rule::Value),
    ("Image Size:", IdentityField::ImageSize, Rule::Value),
    ("Media Id:", IdentityField::MediaId, Rule::ExecutionScoped),
    ("Title Id:", IdentityField::TitleId, Rule::ExecutionScoped),
    ("Version:", IdentityField::Version, Rule::Value),
    ("Base Version:", IdentityField::BaseVersion, Rule::Value),
    ("Disc Number:", IdentityField::DiscNumber, Rule::Number),
    ("Number of Discs:", IdentityField::TotalDiscs, Rule::Number),
    ("Regions", IdentityField::Regions, Rule::NextLine),
    ("ESRB:", IdentityField::EsrbRating, Rule::SecondToken),
    ("PEGI:", IdentityField::PegiRating, Rule::SecondToken),
];

/// Bare flag lines (no colon). Negative words come first since they
/// contain the positive ones.
const FLAGS: &[(&str, IdentityField, bool)] = &[
    ("Devkit", IdentityField::RetailFlag, false),
    ("Retail", IdentityField::RetailFlag, true),
    ("Unencrypted", IdentityField::EncryptionFlag, false),
    ("Encrypted", IdentityField::EncryptionFlag, true),
    ("Uncompressed", IdentityField::CompressionFlag, false),
    ("Compressed", IdentityField::CompressionFlag, true),
];

/// Parse an identity report into a [`ParsedIdentity`].
///
/// Best-effort and line-oriented. Fields the report does not mention keep
/// their defaults and are absent from [`ParsedIdentity::resolved`].
///
/// # Examples
///
/// ```
/// use xex_porter_core::report::parse_identity_report;
///
/// let parsed = parse_identity_report("Execution Id\n  Title Id: 4E4D07F5 (NM-2037)\n");
/// assert_eq!(parsed.title_id(), Some("4E4D07F5"));
///
/// let parsed = parse_identity_report("Title Id: 4E4D07F5\n");
/// assert_eq!(parsed.title_id(), None);
/// ```
pub fn parse_identity_report(text: &str) -> ParsedIdentity {
    let lines: Vec<&str> = text.lines().collect();
    let mut parsed = ParsedIdentity::default();
    let mut last_marker: Option<usize> = None;

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains(EXECUTION_ID_MARKER) {
            last_marker = Some(i);
            continue;
        }

        if !line.contains(':') {
            if let Some(&(_, field, value)) = FLAGS.iter().find(|(word, _, _)| line.contains(word)) {
                set_flag(&mut parsed, field, value);
                continue;
            }
        }

        if let Some(&(prefix, field, rule)) = PREFIXES.iter().find(|(p, _, _)| line.starts_with(p)) {
            let near_marker = last_marker.is_some_and(|m| i - m <= EXECUTION_ID_WINDOW);
            apply_rule(&mut parsed, field, rule, prefix, line, lines.get(i + 1), near_marker);
            continue;
        }

        if let Some(library) = parse_static_library(line) {
            parsed.identity.static_libraries.push(library);
            parsed.resolved.insert(IdentityField::StaticLibraries);
        }
    }

    parsed
}

fn apply_rule(
    parsed: &mut ParsedIdentity,
    field: IdentityField,
    rule: Rule,
    prefix: &str,
    line: &str,
    next_line: Option<&&str>,
    near_marker: bool,
) {
    let value = match rule {
        Rule::Value => Some(value_after_colon(line).to_string()),
        Rule::ExecutionScoped => {
            if !near_marker {
                return;
            }
            let value = value_after_colon(line);
            if field == IdentityField::TitleId {
                leading_hex(value)
            } else {
                Some(value.to_string())
            }
        }
        Rule::Number => {
            let number = value_after_colon(line).parse::<u32>().ok();
            set_number(parsed, field, number.unwrap_or(1));
            if number.is_some() {
                parsed.resolved.insert(field);
            }
            return;
        }
        Rule::NextLine => next_line.map(|l| l.trim().to_string()),
        Rule::SecondToken => {
            // Ratings repeat per board; keep the first PEGI entry.
            if field == IdentityField::PegiRating && parsed.is_resolved(field) {
                return;
            }
            line.split_whitespace().nth(1).map(str::to_string)
        }
    };

    let Some(value) = value else {
        log::trace!("Ignoring report line without usable value for '{}'", prefix);
        return;
    };
    if set_text(parsed, field, value) {
        parsed.resolved.insert(field);
    }
}

fn set_text(parsed: &mut ParsedIdentity, field: IdentityField, value: String) -> bool {
    let id: &mut GameIdentity = &mut parsed.identity;
    let slot = match field {
        IdentityField::OriginalPeName => &mut id.original_pe_name,
        IdentityField::TitleId => &mut id.title_id,
        IdentityField::MediaId => &mut id.media_id,
        IdentityField::Version => &mut id.version,
        IdentityField::BaseVersion => &mut id.base_version,
        IdentityField::Regions => &mut id.regions,
        IdentityField::EsrbRating => &mut id.esrb_rating,
        IdentityField::PegiRating => &mut id.pegi_rating,
        IdentityField::LoadAddress => &mut id.load_address,
        IdentityField::EntryPoint => &mut id.entry_point,
        IdentityField::ImageSize => &mut id.image_size,
        _ => return false,
    };
    *slot = value;
    true
}

fn set_number(parsed: &mut ParsedIdentity, field: IdentityField, value: u32) {
    match field {
        IdentityField::DiscNumber => parsed.identity.disc_number = value,
        IdentityField::TotalDiscs => parsed.identity.total_discs = value,
        _ => {}
    }
}

fn set_flag(parsed: &mut ParsedIdentity, field: IdentityField, value: bool) {
    match field {
        IdentityField::RetailFlag => parsed.identity.is_retail = value,
        IdentityField::EncryptionFlag => parsed.identity.is_encrypted = value,
        IdentityField::CompressionFlag => parsed.identity.is_compressed = value,
        _ => return,
    }
    parsed.resolved.insert(field);
}

/// Text after the first colon, trimmed. Empty when there is no colon.
fn value_after_colon(line: &str) -> &str {
    line.split_once(':').map(|(_, v)| v.trim()).unwrap_or("")
}

/// Leading run of hex digits: `"4E4D07F5  (NM-2037)"` yields `"4E4D07F5"`.
fn leading_hex(value: &str) -> Option<String> {
    let hex: String = value.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
    if hex.is_empty() { None } else { Some(hex) }
}

/// `"0) XMP            v2.0.9328.0"` yields `"XMP 2.0.9328.0"`.
fn parse_static_library(line: &str) -> Option<String> {
    let (ordinal, rest) = line.split_once(')')?;
    if ordinal.is_empty() || !ordinal.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?;
    let version = tokens.next()?;
    let version = version.strip_prefix('v').unwrap_or(version);
    Some(format!("{} {}", name, version))
}

#[cfg(test)]
#[path = "tests/report_tests.rs"]
mod tests;
