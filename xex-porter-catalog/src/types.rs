//! Data model types for the title catalog.
//!
//! These mirror the `games` table row for row; `xex-porter-db` handles
//! persistence.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xex_porter_core::GameIdentity;

/// How many static libraries are kept in the `xex_info_json` blob.
pub const STORED_LIBRARY_LIMIT: usize = 10;

// ── Status ──────────────────────────────────────────────────────────────────

/// Advisory progress tag of a title. Any value may be set at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Pending,
    Dumped,
    Extracted,
    Analysed,
    InProgress,
    Completed,
    Failed,
}

impl GameStatus {
    pub const ALL: [GameStatus; 7] = [
        Self::Pending,
        Self::Dumped,
        Self::Extracted,
        Self::Analysed,
        Self::InProgress,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dumped => "dumped",
            Self::Extracted => "extracted",
            Self::Analysed => "analysed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Strict parse of a user-supplied status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "dumped" => Some(Self::Dumped),
            "extracted" => Some(Self::Extracted),
            "analysed" | "analyzed" => Some(Self::Analysed),
            "in_progress" | "in-progress" | "inprogress" => Some(Self::InProgress),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Lenient decode of a stored value; anything unknown reads as pending.
    pub fn from_str_loose(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Path fields ─────────────────────────────────────────────────────────────

/// The artifact-path columns of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathField {
    IsoPath,
    ExtractedDir,
    XexPath,
    AnalysisJson,
    ProjectToml,
}

impl PathField {
    pub const ALL: [PathField; 5] = [
        Self::IsoPath,
        Self::ExtractedDir,
        Self::XexPath,
        Self::AnalysisJson,
        Self::ProjectToml,
    ];

    /// Column name in the `games` table.
    pub fn column(&self) -> &'static str {
        match self {
            Self::IsoPath => "iso_path",
            Self::ExtractedDir => "extracted_dir",
            Self::XexPath => "xex_path",
            Self::AnalysisJson => "analysis_json",
            Self::ProjectToml => "project_toml",
        }
    }
}

impl fmt::Display for PathField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ── Catalog entry ───────────────────────────────────────────────────────────

/// One processed title.
///
/// `id` is 0 until the entry has been stored. An empty `title_id` means the
/// entry has no catalog identity and is never merged with another row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: i64,
    pub title_id: String,
    pub game_name: String,
    pub status: GameStatus,
    pub created_at: String,
    pub updated_at: String,

    pub iso_path: Option<String>,
    pub extracted_dir: Option<String>,
    pub xex_path: Option<String>,
    pub analysis_json: Option<String>,
    pub project_toml: Option<String>,
    pub notes: Option<String>,

    pub media_id: Option<String>,
    pub version: Option<String>,
    pub disc_number: i64,
    pub total_discs: i64,
    pub regions: Option<String>,
    pub esrb_rating: Option<String>,
    pub entry_point: Option<String>,
    pub original_pe_name: Option<String>,
    pub xex_info_json: Option<String>,
}

impl Default for CatalogEntry {
    fn default() -> Self {
        Self {
            id: 0,
            title_id: String::new(),
            game_name: String::new(),
            status: GameStatus::Pending,
            created_at: String::new(),
            updated_at: String::new(),
            iso_path: None,
            extracted_dir: None,
            xex_path: None,
            analysis_json: None,
            project_toml: None,
            notes: None,
            media_id: None,
            version: None,
            disc_number: 1,
            total_discs: 1,
            regions: None,
            esrb_rating: None,
            entry_point: None,
            original_pe_name: None,
            xex_info_json: None,
        }
    }
}

/// The technical details kept in `xex_info_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredXexInfo {
    pub static_libraries: Vec<String>,
    pub is_retail: bool,
    pub is_encrypted: bool,
    pub load_address: String,
}

impl CatalogEntry {
    pub fn new(title_id: impl Into<String>, game_name: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            game_name: game_name.into(),
            ..Self::default()
        }
    }

    /// Build an entry carrying the identity columns of `identity`.
    ///
    /// Empty identity strings become `None` so an upsert keeps whatever the
    /// row already had.
    pub fn from_identity(identity: &GameIdentity, game_name: impl Into<String>, status: GameStatus) -> Self {
        let info = StoredXexInfo {
            static_libraries: identity
                .static_libraries
                .iter()
                .take(STORED_LIBRARY_LIMIT)
                .cloned()
                .collect(),
            is_retail: identity.is_retail,
            is_encrypted: identity.is_encrypted,
            load_address: identity.load_address.clone(),
        };

        Self {
            title_id: identity.title_id.clone(),
            game_name: game_name.into(),
            status,
            media_id: non_empty(&identity.media_id),
            version: non_empty(&identity.version),
            disc_number: i64::from(identity.disc_number),
            total_discs: i64::from(identity.total_discs),
            regions: non_empty(&identity.regions),
            esrb_rating: non_empty(&identity.esrb_rating),
            entry_point: non_empty(&identity.entry_point),
            original_pe_name: non_empty(&identity.original_pe_name),
            xex_info_json: serde_json::to_string(&info).ok(),
            ..Self::default()
        }
    }

    /// Decode the `xex_info_json` blob, if present and well-formed.
    pub fn xex_info(&self) -> Option<StoredXexInfo> {
        self.xex_info_json
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
    }

    pub fn path(&self, field: PathField) -> Option<&str> {
        match field {
            PathField::IsoPath => self.iso_path.as_deref(),
            PathField::ExtractedDir => self.extracted_dir.as_deref(),
            PathField::XexPath => self.xex_path.as_deref(),
            PathField::AnalysisJson => self.analysis_json.as_deref(),
            PathField::ProjectToml => self.project_toml.as_deref(),
        }
    }

    pub fn set_path(&mut self, field: PathField, value: Option<String>) {
        let slot = match field {
            PathField::IsoPath => &mut self.iso_path,
            PathField::ExtractedDir => &mut self.extracted_dir,
            PathField::XexPath => &mut self.xex_path,
            PathField::AnalysisJson => &mut self.analysis_json,
            PathField::ProjectToml => &mut self.project_toml,
        };
        *slot = value;
    }

    /// Write back the paths returned by a workspace sync.
    pub fn apply_paths(&mut self, paths: &BTreeMap<PathField, PathBuf>) {
        for (field, path) in paths {
            self.set_path(*field, Some(path_string(path)));
        }
    }
}

/// Sparse update applied together with a status change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusPatch {
    pub iso_path: Option<String>,
    pub extracted_dir: Option<String>,
    pub xex_path: Option<String>,
    pub analysis_json: Option<String>,
    pub project_toml: Option<String>,
    pub notes: Option<String>,
}

impl StatusPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, field: PathField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            PathField::IsoPath => self.iso_path = value,
            PathField::ExtractedDir => self.extracted_dir = value,
            PathField::XexPath => self.xex_path = value,
            PathField::AnalysisJson => self.analysis_json = value,
            PathField::ProjectToml => self.project_toml = value,
        }
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// `(column, value)` pairs for every field present in the patch.
    pub fn columns(&self) -> Vec<(&'static str, &str)> {
        [
            ("iso_path", &self.iso_path),
            ("extracted_dir", &self.extracted_dir),
            ("xex_path", &self.xex_path),
            ("analysis_json", &self.analysis_json),
            ("project_toml", &self.project_toml),
            ("notes", &self.notes),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.as_deref().map(|v| (column, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Store paths as UTF-8 text; lossy for the rare non-UTF-8 path.
pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
