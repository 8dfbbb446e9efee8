//! Per-title workspace directories.
//!
//! Every title with a known title id owns exactly one directory under the
//! ports root:
//!
//! ```text
//! <ports root>/<Display Name> [<TITLE_ID>]/
//! ├── info.json
//! ├── notes.md
//! ├── analysis/
//! ├── extracted/
//! ├── cleaned/
//! └── recompiled/
//! ```
//!
//! The directory is located by its `[<TITLE_ID>]` suffix, so the display
//! part of the name may be edited by hand without losing the binding.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha1::Digest;
use xex_porter_catalog::{CatalogEntry, GameStatus, PathField};
use xex_porter_core::GameIdentity;
use xex_porter_core::util::sanitize_folder_name;

pub const INFO_FILE: &str = "info.json";
pub const NOTES_FILE: &str = "notes.md";
pub const SUBDIRECTORIES: &[&str] = &["analysis", "extracted", "cleaned", "recompiled"];

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Contents of `info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfo {
    pub title_id: String,
    pub game_name: String,
    pub version: String,
    pub media_id: String,
    pub regions: String,
    pub esrb_rating: String,
    pub disc_number: u32,
    pub total_discs: u32,
    pub entry_point: String,
    pub original_pe_name: String,
    /// `"drive"`, `"iso"` or `"xex"`: what the pipeline started from.
    pub source_type: String,
    pub source_path: String,
    pub status: GameStatus,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for GameInfo {
    fn default() -> Self {
        Self {
            title_id: String::new(),
            game_name: String::new(),
            version: String::new(),
            media_id: String::new(),
            regions: String::new(),
            esrb_rating: String::new(),
            disc_number: 1,
            total_discs: 1,
            entry_point: String::new(),
            original_pe_name: String::new(),
            source_type: String::new(),
            source_path: String::new(),
            status: GameStatus::Pending,
            notes: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}

impl GameInfo {
    pub fn new(title_id: impl Into<String>, game_name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            title_id: title_id.into(),
            game_name: game_name.into(),
            created_at: now.clone(),
            updated_at: now,
            ..Self::default()
        }
    }

    pub fn from_identity(
        identity: &GameIdentity,
        game_name: impl Into<String>,
        source_type: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            version: identity.version.clone(),
            media_id: identity.media_id.clone(),
            regions: identity.regions.clone(),
            esrb_rating: identity.esrb_rating.clone(),
            disc_number: identity.disc_number,
            total_discs: identity.total_discs,
            entry_point: identity.entry_point.clone(),
            original_pe_name: identity.original_pe_name.clone(),
            source_type: source_type.into(),
            source_path: source_path.into(),
            status: GameStatus::Analysed,
            ..Self::new(identity.title_id.clone(), game_name)
        }
    }
}

/// A file tracked by a catalog entry that lives outside its workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalFile {
    pub kind: PathField,
    pub label: &'static str,
    pub current_path: PathBuf,
    pub target_path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub kind: PathField,
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of [`Workspace::sync_all`]. The caller writes `new_paths` back
/// into the catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub new_paths: BTreeMap<PathField, PathBuf>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ── Workspace ───────────────────────────────────────────────────────────────

/// One title's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    title_id: String,
    name: String,
    root: PathBuf,
}

impl Workspace {
    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    /// Display part of the directory name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn analysis_dir(&self) -> PathBuf {
        self.root.join("analysis")
    }

    pub fn extracted_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    pub fn cleaned_dir(&self) -> PathBuf {
        self.root.join("cleaned")
    }

    pub fn recompiled_dir(&self) -> PathBuf {
        self.root.join("recompiled")
    }

    pub fn info_file(&self) -> PathBuf {
        self.root.join(INFO_FILE)
    }

    pub fn notes_file(&self) -> PathBuf {
        self.root.join(NOTES_FILE)
    }

    /// Write `info.json`, stamping `updated_at` (and `created_at` if unset).
    pub fn save_info(&self, info: &GameInfo) -> io::Result<()> {
        let mut info = info.clone();
        let now = chrono::Utc::now().to_rfc3339();
        if info.created_at.is_empty() {
            info.created_at = now.clone();
        }
        info.updated_at = now;

        let json = serde_json::to_string_pretty(&info).map_err(io::Error::other)?;
        std::fs::write(self.info_file(), json)
    }

    /// Read `info.json`. `None` when the file is absent.
    pub fn load_info(&self) -> io::Result<Option<GameInfo>> {
        read_info(&self.info_file())
    }

    pub fn notes(&self) -> io::Result<String> {
        match std::fs::read_to_string(self.notes_file()) {
            Ok(s) => Ok(s),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e),
        }
    }

    pub fn save_notes(&self, notes: &str) -> io::Result<()> {
        std::fs::write(self.notes_file(), notes)
    }

    /// Whether `path` lies under this workspace's root.
    ///
    /// Compares path components after resolving symlinks, so a sibling
    /// directory sharing a name prefix is not "inside".
    pub fn contains(&self, path: &Path) -> bool {
        let root = resolve(&self.root);
        resolve(path).starts_with(&root)
    }

    /// Where each tracked field's file belongs inside the workspace.
    fn target_for(&self, field: PathField, current: &Path) -> Option<(PathBuf, &'static str)> {
        match field {
            PathField::XexPath => Some((self.root.join("default.xex"), "Primary binary")),
            PathField::IsoPath => Some((self.root.join("game.iso"), "Disc image")),
            PathField::ProjectToml => current
                .file_name()
                .map(|n| (self.analysis_dir().join(n), "Build configuration")),
            PathField::AnalysisJson => current
                .file_name()
                .map(|n| (self.analysis_dir().join(n), "Analysis report")),
            PathField::ExtractedDir => None,
        }
    }

    /// Tracked files of `entry` that exist outside this workspace.
    pub fn check_external_files(&self, entry: &CatalogEntry) -> Vec<ExternalFile> {
        let mut external = Vec::new();
        for field in PathField::ALL {
            let Some(current) = entry.path(field) else {
                continue;
            };
            let current = PathBuf::from(current);
            let Some((target, label)) = self.target_for(field, &current) else {
                continue;
            };
            if self.contains(&current) {
                continue;
            }
            let Ok(meta) = std::fs::metadata(&current) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            external.push(ExternalFile {
                kind: field,
                label,
                current_path: current,
                target_path: target,
                size: meta.len(),
            });
        }
        external
    }

    /// Copy every external file of `entry` into the workspace.
    ///
    /// Each copy is checked by size, and by SHA-1 when `verify_content` is
    /// set. A failed file is recorded and the rest still proceed.
    pub fn sync_all(&self, entry: &CatalogEntry, verify_content: bool) -> SyncReport {
        let mut report = SyncReport::default();
        for file in self.check_external_files(entry) {
            match copy_verified(&file, verify_content) {
                Ok(()) => {
                    log::info!(
                        "Copied {} into workspace: {}",
                        file.label,
                        file.target_path.display()
                    );
                    report.new_paths.insert(file.kind, file.target_path);
                }
                Err(message) => {
                    log::warn!(
                        "Could not copy {} ({}): {}",
                        file.label,
                        file.current_path.display(),
                        message
                    );
                    report.failures.push(SyncFailure {
                        kind: file.kind,
                        path: file.current_path,
                        message,
                    });
                }
            }
        }
        report
    }
}

fn copy_verified(file: &ExternalFile, verify_content: bool) -> Result<(), String> {
    if let Some(parent) = file.target_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::copy(&file.current_path, &file.target_path).map_err(|e| e.to_string())?;

    let copied = std::fs::metadata(&file.target_path)
        .map_err(|e| e.to_string())?
        .len();
    if copied != file.size {
        return Err(format!("size mismatch: expected {} bytes, copied {}", file.size, copied));
    }

    if verify_content {
        let source = file_sha1(&file.current_path).map_err(|e| e.to_string())?;
        let target = file_sha1(&file.target_path).map_err(|e| e.to_string())?;
        if source != target {
            return Err(format!("SHA-1 mismatch: {} vs {}", source, target));
        }
    }
    Ok(())
}

/// Hex SHA-1 of a file's contents.
pub fn file_sha1(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut sha = sha1::Sha1::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        sha.update(&buf[..n]);
    }
    Ok(format!("{:x}", sha.finalize()))
}

/// Canonical form when the path exists, otherwise the path as given.
fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn read_info(path: &Path) -> io::Result<Option<GameInfo>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

// ── Manager ─────────────────────────────────────────────────────────────────

/// Finds and creates workspaces under one ports root.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name for a new workspace: `"<sanitized name> [<title id>]"`.
    pub fn folder_name(title_id: &str, display_name: &str) -> String {
        let name = if display_name.trim().is_empty() {
            title_id
        } else {
            display_name
        };
        format!("{} [{}]", sanitize_folder_name(name), title_id)
    }

    /// Bind to the workspace of `title_id`, creating it if none exists.
    ///
    /// An existing directory is reused as-is, even if `display_name` now
    /// differs from its name. Returns the workspace and whether it was
    /// created by this call.
    pub fn get_or_create(&self, title_id: &str, display_name: &str) -> io::Result<(Workspace, bool)> {
        if title_id.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "a workspace needs a title id",
            ));
        }

        if let Some(existing) = self.find_existing(title_id)? {
            ensure_layout(&existing.root)?;
            return Ok((existing, false));
        }

        let folder = Self::folder_name(title_id, display_name);
        let root = self.root.join(&folder);
        ensure_layout(&root)?;

        let workspace = Workspace {
            title_id: title_id.to_string(),
            name: folder_display_name(&folder, title_id).to_string(),
            root,
        };
        if !workspace.notes_file().exists() {
            workspace.save_notes(&format!("# {}\n\nPort notes:\n\n", workspace.name))?;
        }
        if !workspace.info_file().exists() {
            workspace.save_info(&GameInfo::new(title_id, workspace.name.clone()))?;
        }

        log::info!("Created workspace {}", workspace.root.display());
        Ok((workspace, true))
    }

    /// Locate the workspace of `title_id` without creating anything.
    ///
    /// Directories named `... [<title id>]` win; otherwise a directory whose
    /// `info.json` names the title id is accepted (it was renamed by hand).
    pub fn find_existing(&self, title_id: &str) -> io::Result<Option<Workspace>> {
        let dirs = self.child_dirs()?;
        let suffix = format!("[{}]", title_id);

        for dir in &dirs {
            let Some(folder) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if folder.ends_with(&suffix) {
                return Ok(Some(Workspace {
                    title_id: title_id.to_string(),
                    name: folder_display_name(folder, title_id).to_string(),
                    root: dir.clone(),
                }));
            }
        }

        for dir in &dirs {
            let Ok(Some(info)) = read_info(&dir.join(INFO_FILE)) else {
                continue;
            };
            if info.title_id == title_id {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                log::debug!("Matched workspace {} through {}", dir.display(), INFO_FILE);
                return Ok(Some(Workspace {
                    title_id: title_id.to_string(),
                    name,
                    root: dir.clone(),
                }));
            }
        }

        Ok(None)
    }

    /// Every workspace under the root whose directory name carries a title id.
    pub fn list_all(&self) -> io::Result<Vec<Workspace>> {
        Ok(self
            .child_dirs()?
            .into_iter()
            .filter_map(|dir| {
                let folder = dir.file_name()?.to_str()?.to_string();
                let title_id = folder_title_id(&folder)?.to_string();
                Some(Workspace {
                    name: folder_display_name(&folder, &title_id).to_string(),
                    title_id,
                    root: dir,
                })
            })
            .collect())
    }

    /// Immediate subdirectories of the root, sorted. Empty if the root is absent.
    fn child_dirs(&self) -> io::Result<Vec<PathBuf>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();
        Ok(dirs)
    }
}

fn ensure_layout(root: &Path) -> io::Result<()> {
    for sub in SUBDIRECTORIES {
        std::fs::create_dir_all(root.join(sub))?;
    }
    Ok(())
}

/// `"Halo 3 [4D5307E6]"` yields `"4D5307E6"`.
fn folder_title_id(folder: &str) -> Option<&str> {
    let inner = folder.strip_suffix(']')?;
    let start = inner.rfind('[')?;
    let id = &inner[start + 1..];
    if id.is_empty() { None } else { Some(id) }
}

/// `"Halo 3 [4D5307E6]"` yields `"Halo 3"`.
fn folder_display_name<'a>(folder: &'a str, title_id: &str) -> &'a str {
    let suffix = format!("[{}]", title_id);
    folder.strip_suffix(suffix.as_str()).unwrap_or(folder).trim_end()
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
