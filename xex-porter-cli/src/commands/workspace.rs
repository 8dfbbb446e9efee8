use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_core::util::format_bytes_approx;
use xex_porter_lib::WorkspaceManager;

use crate::CliError;

use super::{catalog_path, load_settings, open_catalog, require_entry, truncate_str};

/// Entry point for `workspace check`.
pub(crate) fn run_workspace_check(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    id: i64,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;
    let entry = require_entry(&conn, id)?;
    if entry.title_id.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "game {} has no title id, so it has no workspace",
            id
        )));
    }

    let manager = WorkspaceManager::new(settings.ports_root.clone());
    let Some(workspace) = manager.find_existing(&entry.title_id)? else {
        log::info!("No workspace exists yet for {}.", entry.title_id);
        log::info!("  Run 'xex-porter workspace sync {}' to create one.", id);
        return Ok(());
    };

    log::info!(
        "{} {}",
        "Workspace:".if_supports_color(Stdout, |t| t.bold()),
        workspace.root().display()
    );
    let external = workspace.check_external_files(&entry);
    if external.is_empty() {
        log::info!(
            "  {}",
            "All tracked files are inside the workspace.".if_supports_color(Stdout, |t| t.green()),
        );
        return Ok(());
    }

    crate::log_blank();
    log::info!("  {} file(s) outside the workspace:", external.len());
    let mut total = 0u64;
    for file in &external {
        total += file.size;
        log::info!(
            "    {} {} ({})",
            format!("{:<20}", format!("{}:", file.label)).if_supports_color(Stdout, |t| t.yellow()),
            file.current_path.display(),
            format_bytes_approx(file.size),
        );
        log::info!(
            "    {:<20} -> {}",
            "",
            file.target_path.display().if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();
    log::info!("  Total to copy: {}", format_bytes_approx(total));
    log::info!("  Run 'xex-porter workspace sync {}' to copy them in.", id);
    Ok(())
}

/// Entry point for `workspace sync`.
pub(crate) fn run_workspace_sync(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    id: i64,
    verify: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;
    let entry = require_entry(&conn, id)?;
    if entry.title_id.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "game {} has no title id, so it has no workspace",
            id
        )));
    }

    let manager = WorkspaceManager::new(settings.ports_root.clone());
    let (workspace, created) = manager.get_or_create(&entry.title_id, &entry.game_name)?;
    if created {
        log::info!("Created workspace {}", workspace.root().display());
    }

    let report = workspace.sync_all(&entry, verify || settings.verify_content);
    if !report.new_paths.is_empty() {
        xex_porter_db::apply_paths(&conn, id, &report.new_paths)
            .map_err(|e| CliError::database(format!("Failed to record new paths: {}", e)))?;
    }

    for (field, path) in &report.new_paths {
        log::info!(
            "  {} {:<14} {}",
            "\u{2713}".if_supports_color(Stdout, |t| t.green()),
            field.column(),
            path.display()
        );
    }
    for failure in &report.failures {
        log::warn!(
            "  {} {}: {}",
            failure.kind.column(),
            failure.path.display(),
            failure.message
        );
    }

    crate::log_blank();
    if report.new_paths.is_empty() && report.is_clean() {
        log::info!("Nothing to copy; the workspace is up to date.");
    } else {
        log::info!(
            "Copied {} file(s), {} failure(s).",
            report.new_paths.len(),
            report.failures.len()
        );
    }

    if report.is_clean() {
        Ok(())
    } else {
        Err(CliError::Io(std::io::Error::other(format!(
            "{} file(s) could not be copied into {}",
            report.failures.len(),
            workspace.root().display()
        ))))
    }
}

/// Entry point for `workspace list`.
pub(crate) fn run_workspace_list(config: Option<PathBuf>, db: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let manager = WorkspaceManager::new(settings.ports_root.clone());
    let workspaces = manager.list_all()?;

    log::info!(
        "{} {}",
        "Ports root:".if_supports_color(Stdout, |t| t.bold()),
        manager.root().display()
    );
    if workspaces.is_empty() {
        log::info!("  No workspaces yet.");
        return Ok(());
    }

    // Status column only when a catalog already exists; listing must not create one.
    let conn = if catalog_path(&settings, db.clone()).exists() {
        Some(open_catalog(&settings, db)?)
    } else {
        None
    };

    crate::log_blank();
    for workspace in &workspaces {
        let status = conn
            .as_ref()
            .and_then(|c| xex_porter_db::get_game_by_title_id(c, workspace.title_id()).ok().flatten())
            .map(|e| e.status.as_str().to_string())
            .unwrap_or_else(|| "untracked".to_string());
        log::info!(
            "  {:<8}  {:<40}  {}",
            workspace.title_id(),
            truncate_str(workspace.name(), 40),
            status.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}
