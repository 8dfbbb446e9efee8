//! End-to-end conversion of one title: dump, extract, analyse, configure,
//! and record the result.
//!
//! The configure stage merges the title's game profile (or the default
//! profile) into the generated build configuration.
//!
//! A run starts from whichever input is furthest upstream (drive, then disc
//! image, then binary) and enters each later stage only once the previous
//! stage produced its artifact. The first hard failure ends the run; the
//! persist stage never fails a run.

use std::fmt;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use xex_porter_catalog::{CatalogEntry, GameStatus, PathField, path_string};
use xex_porter_core::{ParsedIdentity, parse_identity_report};

use crate::build_config::BuildConfig;
use crate::error::{PersistError, PipelineError};
use crate::profiles::{GameProfile, ProfileManager};
use crate::progress::{PipelineProgress, SilentProgress};
use crate::settings::Settings;
use crate::toolchain::{Toolchain, find_primary_binary};
use crate::workspace::{GameInfo, Workspace, WorkspaceManager};

/// Name of the dumped disc image inside the output directory.
pub const DISC_IMAGE_NAME: &str = "game.iso";
pub const EXTRACTED_DIR_NAME: &str = "extracted";
pub const ANALYSIS_DIR_NAME: &str = "analysis";
pub const PROJECT_DIR_NAME: &str = "project";

/// One step of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Dump,
    Extract,
    Analyse,
    Configure,
    Persist,
}

impl Stage {
    pub const ALL: &'static [Stage] = &[
        Stage::Dump,
        Stage::Extract,
        Stage::Analyse,
        Stage::Configure,
        Stage::Persist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dump => "dump",
            Self::Extract => "extract",
            Self::Analyse => "analyse",
            Self::Configure => "configure",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// What to convert. Set at least one input; when several are set the one
/// furthest upstream wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Optical drive to dump (`E:`, `/dev/sr0`).
    pub drive: Option<String>,
    pub disc_image: Option<PathBuf>,
    pub binary: Option<PathBuf>,
    /// Defaults to [`Settings::pipeline_output_dir`].
    pub output_dir: Option<PathBuf>,
}

/// Files produced (or supplied) during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    pub disc_image: Option<PathBuf>,
    pub extracted_dir: Option<PathBuf>,
    pub primary_binary: Option<PathBuf>,
    pub analysis_toml: Option<PathBuf>,
    pub analysis_json: Option<PathBuf>,
    pub build_config: Option<PathBuf>,
}

/// Outcome of [`Pipeline::run`].
#[derive(Debug, Default)]
pub struct PipelineRun {
    pub success: bool,
    pub steps_completed: Vec<Stage>,
    pub artifacts: Artifacts,
    pub identity: Option<ParsedIdentity>,
    /// Profile merged into the build configuration.
    pub profile: Option<GameProfile>,
    /// Catalog row written by the persist stage.
    pub catalog_id: Option<i64>,
    pub workspace: Option<Workspace>,
    pub error: Option<PipelineError>,
}

impl PipelineRun {
    pub fn completed(&self, stage: Stage) -> bool {
        self.steps_completed.contains(&stage)
    }
}

/// The input a run starts from.
#[derive(Debug, Clone)]
enum Source {
    Drive(String),
    Image(PathBuf),
    Binary(PathBuf),
}

impl Source {
    fn from_request(request: &PipelineRequest) -> Result<Self, PipelineError> {
        let drive = request.drive.as_deref().map(str::trim).filter(|d| !d.is_empty());
        let source = if let Some(drive) = drive {
            Self::Drive(drive.to_string())
        } else if let Some(image) = &request.disc_image {
            Self::Image(image.clone())
        } else if let Some(binary) = &request.binary {
            Self::Binary(binary.clone())
        } else {
            return Err(PipelineError::configuration(
                "no input given: provide a drive, a disc image or a binary",
            ));
        };

        if let Self::Drive(_) = source {
            if let Some(image) = &request.disc_image {
                log::info!("Ignoring disc image {}: dumping from the drive", image.display());
            }
        }
        if !matches!(source, Self::Binary(_)) {
            if let Some(binary) = &request.binary {
                log::info!("Ignoring binary {}: it will be extracted from the disc", binary.display());
            }
        }
        Ok(source)
    }

    /// `info.json` source type.
    fn kind(&self) -> &'static str {
        match self {
            Self::Drive(_) => "drive",
            Self::Image(_) => "iso",
            Self::Binary(_) => "xex",
        }
    }

    fn detail(&self) -> String {
        match self {
            Self::Drive(drive) => drive.clone(),
            Self::Image(path) | Self::Binary(path) => path_string(path),
        }
    }
}

/// Runs the stage chain against a [`Toolchain`].
///
/// The catalog is optional: without one the run stops after `configure`.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    toolchain: &'a dyn Toolchain,
    catalog: Option<&'a Connection>,
    workspaces: WorkspaceManager,
    profiles: ProfileManager,
    progress: &'a dyn PipelineProgress,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings, toolchain: &'a dyn Toolchain) -> Self {
        Self {
            settings,
            toolchain,
            catalog: None,
            workspaces: WorkspaceManager::new(settings.ports_root.clone()),
            profiles: ProfileManager::new(settings.profiles_dir.clone()),
            progress: &SilentProgress,
        }
    }

    pub fn with_catalog(mut self, conn: &'a Connection) -> Self {
        self.catalog = Some(conn);
        self
    }

    pub fn with_workspaces(mut self, workspaces: WorkspaceManager) -> Self {
        self.workspaces = workspaces;
        self
    }

    pub fn with_profiles(mut self, profiles: ProfileManager) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn PipelineProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the chain for `request`. Never panics on tool failure; the
    /// terminal error, if any, is in [`PipelineRun::error`].
    pub fn run(&self, request: &PipelineRequest) -> PipelineRun {
        let mut run = PipelineRun::default();
        match self.execute(request, &mut run) {
            Ok(()) => run.success = true,
            Err(e) => {
                log::debug!("Pipeline stopped: {}", e);
                run.error = Some(e);
            }
        }
        run
    }

    fn execute(&self, request: &PipelineRequest, run: &mut PipelineRun) -> Result<(), PipelineError> {
        let source = Source::from_request(request)?;
        let out_dir = request
            .output_dir
            .clone()
            .unwrap_or_else(|| self.settings.pipeline_output_dir());
        std::fs::create_dir_all(&out_dir).map_err(|e| {
            PipelineError::configuration(format!(
                "cannot create output directory {}: {}",
                out_dir.display(),
                e
            ))
        })?;
        log::debug!("Pipeline output directory: {}", out_dir.display());

        let binary = match &source {
            Source::Drive(drive) => {
                let image = self.dump(drive, &out_dir, run)?;
                self.extract(&image, &out_dir, run)?
            }
            Source::Image(image) => {
                require_file(image, "disc image")?;
                run.artifacts.disc_image = Some(image.clone());
                self.extract(image, &out_dir, run)?
            }
            Source::Binary(binary) => {
                require_file(binary, "binary")?;
                binary.clone()
            }
        };
        run.artifacts.primary_binary = Some(binary.clone());

        let identity = self.analyse(&binary, &out_dir, run)?;
        self.configure(&binary, &identity, &out_dir, run)?;
        self.persist_soft(&source, &binary, &identity, run);
        Ok(())
    }

    fn start(&self, stage: Stage, detail: &str) {
        self.progress.on_stage_start(stage, detail);
    }

    fn complete(&self, run: &mut PipelineRun, stage: Stage, output: &Path) {
        run.steps_completed.push(stage);
        self.progress
            .on_stage_complete(stage, &output.display().to_string());
    }

    // ── Stages ──────────────────────────────────────────────────────────────

    fn dump(&self, drive: &str, out_dir: &Path, run: &mut PipelineRun) -> Result<PathBuf, PipelineError> {
        let image = out_dir.join(DISC_IMAGE_NAME);
        self.start(Stage::Dump, drive);

        if let Err(e) = self.toolchain.dump_disc(drive, &image) {
            if image.exists() {
                if let Err(rm) = std::fs::remove_file(&image) {
                    log::warn!("Could not remove partial image {}: {}", image.display(), rm);
                }
            }
            return Err(PipelineError::stage(
                Stage::Dump,
                format!("could not dump drive {}: {}", drive, e),
            ));
        }

        run.artifacts.disc_image = Some(image.clone());
        self.complete(run, Stage::Dump, &image);
        Ok(image)
    }

    fn extract(&self, image: &Path, out_dir: &Path, run: &mut PipelineRun) -> Result<PathBuf, PipelineError> {
        let dir = unique_dir(&out_dir.join(EXTRACTED_DIR_NAME));
        self.start(Stage::Extract, &image.display().to_string());

        self.toolchain
            .extract_image(image, &dir)
            .map_err(|e| PipelineError::stage(Stage::Extract, e.to_string()))?;
        run.artifacts.extracted_dir = Some(dir.clone());
        self.complete(run, Stage::Extract, &dir);

        let binary = find_primary_binary(&dir)
            .map_err(|e| PipelineError::stage(Stage::Extract, format!("cannot scan {}: {}", dir.display(), e)))?
            .ok_or_else(|| PipelineError::not_found(format!("no .xex binary in {}", dir.display())))?;
        self.progress
            .on_message(&format!("Primary binary: {}", binary.display()));
        Ok(binary)
    }

    fn analyse(&self, binary: &Path, out_dir: &Path, run: &mut PipelineRun) -> Result<ParsedIdentity, PipelineError> {
        self.start(Stage::Analyse, &binary.display().to_string());
        let stage_err = |e: crate::error::ToolError| PipelineError::stage(Stage::Analyse, e.to_string());

        let text = self.toolchain.identity_text(binary).map_err(stage_err)?;
        let identity = parse_identity_report(&text);
        match identity.title_id() {
            Some(tid) => self.progress.on_message(&format!(
                "Title {} ({})",
                tid,
                identity.identity.display_name()
            )),
            None => log::warn!("No title id in the identity report of {}", binary.display()),
        }
        run.identity = Some(identity.clone());

        let output = self
            .toolchain
            .analyse(binary, &out_dir.join(ANALYSIS_DIR_NAME), &identity)
            .map_err(stage_err)?;
        run.artifacts.analysis_toml = Some(output.report_toml);
        run.artifacts.analysis_json = Some(output.report_json.clone());

        self.complete(run, Stage::Analyse, &output.report_json);
        Ok(identity)
    }

    fn configure(
        &self,
        binary: &Path,
        identity: &ParsedIdentity,
        out_dir: &Path,
        run: &mut PipelineRun,
    ) -> Result<(), PipelineError> {
        self.start(Stage::Configure, &binary.display().to_string());
        let profile = match identity.title_id() {
            Some(tid) => self.profiles.get_profile_or_default(tid),
            None => self.profiles.default_profile(),
        };
        self.progress
            .on_message(&format!("Profile: {}", profile.label()));

        let mut build = BuildConfig::new(binary, run.artifacts.analysis_toml.clone());
        profile.apply_to(&mut build);
        run.profile = Some(profile);
        let config = build
            .write_to_dir(&out_dir.join(PROJECT_DIR_NAME))
            .map_err(|e| PipelineError::stage(Stage::Configure, e.to_string()))?;
        run.artifacts.build_config = Some(config.clone());
        self.complete(run, Stage::Configure, &config);
        Ok(())
    }

    fn persist_soft(&self, source: &Source, binary: &Path, identity: &ParsedIdentity, run: &mut PipelineRun) {
        let Some(conn) = self.catalog else {
            log::debug!("No catalog attached; not recording this run");
            return;
        };
        let Some(title_id) = identity.title_id() else {
            log::info!("Title id unknown; not recording this run");
            return;
        };

        self.start(Stage::Persist, title_id);
        match self.persist(conn, source, binary, identity, &run.artifacts) {
            Ok((id, workspace)) => {
                run.catalog_id = Some(id);
                let root = workspace.root().to_path_buf();
                run.workspace = Some(workspace);
                self.complete(run, Stage::Persist, &root);
            }
            Err(e) => log::warn!("Could not record {}: {}", title_id, e),
        }
    }

    fn persist(
        &self,
        conn: &Connection,
        source: &Source,
        binary: &Path,
        identity: &ParsedIdentity,
        artifacts: &Artifacts,
    ) -> Result<(i64, Workspace), PersistError> {
        let game = &identity.identity;
        let name = game_name(identity, binary);
        let (workspace, created) = self.workspaces.get_or_create(&game.title_id, &name)?;
        if !created {
            log::debug!("Reusing workspace {}", workspace.root().display());
        }

        let mut entry = CatalogEntry::from_identity(game, name.clone(), GameStatus::Analysed);
        let tracked = [
            (PathField::IsoPath, &artifacts.disc_image),
            (PathField::ExtractedDir, &artifacts.extracted_dir),
            (PathField::XexPath, &artifacts.primary_binary),
            (PathField::AnalysisJson, &artifacts.analysis_json),
            (PathField::ProjectToml, &artifacts.build_config),
        ];
        for (field, path) in tracked {
            entry.set_path(field, path.as_deref().map(path_string));
        }

        let report = workspace.sync_all(&entry, self.settings.verify_content);
        entry.apply_paths(&report.new_paths);

        let mut info = GameInfo::from_identity(game, name, source.kind(), source.detail());
        if let Ok(Some(previous)) = workspace.load_info() {
            info.created_at = previous.created_at;
            info.notes = previous.notes;
        }
        workspace.save_info(&info)?;

        let outcome = xex_porter_db::upsert_game(conn, &entry)?;
        log::info!(
            "{} catalog entry {} for {}",
            if outcome.created { "Created" } else { "Updated" },
            outcome.id,
            game.title_id
        );
        Ok((outcome.id, workspace))
    }
}

/// Display name of the title, falling back to the binary's file stem.
pub fn game_name(identity: &ParsedIdentity, binary: &Path) -> String {
    let name = identity.identity.display_name();
    if !name.is_empty() {
        return name;
    }
    binary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `base`, or `base_1`, `base_2`, ... when it already exists.
fn unique_dir(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = base.with_file_name(format!("{}_{}", name, n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn require_file(path: &Path, what: &str) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::not_found(format!("{} {}", what, path.display())))
    }
}

#[cfg(test)]
#[path = "tests/pipeline_tests.rs"]
mod tests;
