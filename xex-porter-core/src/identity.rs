//! Title identity extracted from a primary binary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Identity metadata of a title, as reported by the inspection tool.
///
/// Produced fresh by every analysis; nothing here is meant to be edited by
/// hand. Only `title_id` participates in identity; everything else is
/// descriptive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameIdentity {
    pub original_pe_name: String,
    pub title_id: String,
    pub media_id: String,

    pub version: String,
    pub base_version: String,

    pub disc_number: u32,
    pub total_discs: u32,

    pub regions: String,
    pub esrb_rating: String,
    pub pegi_rating: String,

    pub load_address: String,
    pub entry_point: String,
    pub image_size: String,

    pub is_retail: bool,
    pub is_encrypted: bool,
    pub is_compressed: bool,

    /// Static libraries linked into the image, in report order (`"NAME VERSION"`).
    pub static_libraries: Vec<String>,
}

impl Default for GameIdentity {
    fn default() -> Self {
        Self {
            original_pe_name: String::new(),
            title_id: String::new(),
            media_id: String::new(),
            version: String::new(),
            base_version: String::new(),
            disc_number: 1,
            total_discs: 1,
            regions: String::new(),
            esrb_rating: String::new(),
            pegi_rating: String::new(),
            load_address: String::new(),
            entry_point: String::new(),
            image_size: String::new(),
            is_retail: true,
            is_encrypted: true,
            is_compressed: false,
            static_libraries: Vec::new(),
        }
    }
}

impl GameIdentity {
    /// Human-readable name derived from the original PE name.
    ///
    /// `DeadToRights_xenon.exe` becomes `Dead To Rights`. Presentation only:
    /// two titles with the same display name are still distinct titles.
    pub fn display_name(&self) -> String {
        if self.original_pe_name.is_empty() {
            return String::new();
        }
        let stem = strip_suffix_ignore_case(&self.original_pe_name, "_xenon.exe")
            .or_else(|| strip_suffix_ignore_case(&self.original_pe_name, ".exe"))
            .unwrap_or(&self.original_pe_name);

        split_words(stem).trim().to_string()
    }
}

/// Each field a report can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityField {
    OriginalPeName,
    TitleId,
    MediaId,
    Version,
    BaseVersion,
    DiscNumber,
    TotalDiscs,
    Regions,
    EsrbRating,
    PegiRating,
    LoadAddress,
    EntryPoint,
    ImageSize,
    RetailFlag,
    EncryptionFlag,
    CompressionFlag,
    StaticLibraries,
}

/// A best-effort parse result: the identity plus the fields actually read.
///
/// Lets callers tell "the report never mentioned a title id" apart from
/// "the title id is genuinely empty".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedIdentity {
    pub identity: GameIdentity,
    pub resolved: BTreeSet<IdentityField>,
}

impl ParsedIdentity {
    pub fn is_resolved(&self, field: IdentityField) -> bool {
        self.resolved.contains(&field)
    }

    /// True when a non-empty title id was read from the report.
    pub fn has_title_id(&self) -> bool {
        self.is_resolved(IdentityField::TitleId) && !self.identity.title_id.is_empty()
    }

    /// The title id, if one was resolved.
    pub fn title_id(&self) -> Option<&str> {
        if self.has_title_id() {
            Some(&self.identity.title_id)
        } else {
            None
        }
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let start = s.len().checked_sub(suffix.len())?;
    let tail = s.get(start..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..start)
    } else {
        None
    }
}

/// Insert a space at each lower-to-upper boundary and turn underscores into spaces.
fn split_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    let mut prev: Option<char> = None;
    for c in s.chars() {
        if c == '_' {
            out.push(' ');
        } else {
            if let Some(p) = prev {
                if p.is_ascii_lowercase() && c.is_ascii_uppercase() {
                    out.push(' ');
                }
            }
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
#[path = "tests/identity_tests.rs"]
mod tests;
