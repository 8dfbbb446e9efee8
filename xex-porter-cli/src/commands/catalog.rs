use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use xex_porter_catalog::{CatalogEntry, GameStatus, PathField, StatusPatch, path_string};
use xex_porter_lib::WorkspaceManager;

use crate::CliError;

use super::{catalog_path, load_settings, open_catalog, require_entry, truncate_str};

fn parse_status(s: &str) -> Result<GameStatus, CliError> {
    GameStatus::parse(s).ok_or_else(|| {
        let known: Vec<&str> = GameStatus::ALL.iter().map(GameStatus::as_str).collect();
        CliError::invalid_argument(format!(
            "unknown status '{}' (expected one of: {})",
            s,
            known.join(", ")
        ))
    })
}

fn print_table(entries: &[CatalogEntry]) {
    log::info!(
        "{}",
        format!(
            "  {:>4}  {:<8}  {:<40}  {:<12}  {}",
            "ID", "TITLE ID", "NAME", "STATUS", "UPDATED"
        )
        .if_supports_color(Stdout, |t| t.dimmed()),
    );
    for entry in entries {
        let tid = if entry.title_id.is_empty() {
            "-"
        } else {
            entry.title_id.as_str()
        };
        log::info!(
            "  {:>4}  {:<8}  {:<40}  {:<12}  {}",
            entry.id,
            tid,
            truncate_str(&entry.game_name, 40),
            entry.status.as_str(),
            entry.updated_at,
        );
    }
}

/// Entry point for `catalog list`.
pub(crate) fn run_catalog_list(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    status: Option<String>,
    limit: usize,
) -> Result<(), CliError> {
    let status = status.as_deref().map(parse_status).transpose()?;
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;

    let entries = xex_porter_db::list_games(&conn, status, limit)
        .map_err(|e| CliError::database(format!("Failed to list games: {}", e)))?;
    if entries.is_empty() {
        match status {
            Some(s) => log::info!("No games with status '{}'.", s),
            None => log::info!("The catalog is empty. Run 'xex-porter pipeline' to add a title."),
        }
        return Ok(());
    }

    print_table(&entries);
    let total = xex_porter_db::count_games(&conn, status)
        .map_err(|e| CliError::database(format!("Failed to count games: {}", e)))?;
    if total > entries.len() as i64 {
        crate::log_blank();
        log::info!("  Showing {} of {} (use --limit to see more)", entries.len(), total);
    }
    Ok(())
}

/// Entry point for `catalog search`.
pub(crate) fn run_catalog_search(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    term: &str,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;
    let entries = xex_porter_db::search_games(&conn, term)
        .map_err(|e| CliError::database(format!("Search failed: {}", e)))?;

    if entries.is_empty() {
        log::info!("No games match '{}'.", term);
        return Ok(());
    }
    print_table(&entries);
    Ok(())
}

/// Entry point for `catalog show`.
pub(crate) fn run_catalog_show(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    id: i64,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;
    let entry = require_entry(&conn, id)?;

    log::info!(
        "{} {}",
        entry.game_name.if_supports_color(Stdout, |t| t.bold()),
        format!("[{}]", entry.title_id).if_supports_color(Stdout, |t| t.dimmed()),
    );
    crate::log_blank();

    let row = |label: &str, value: Option<&str>| {
        log::info!(
            "  {} {}",
            format!("{:<18}", format!("{}:", label)).if_supports_color(Stdout, |t| t.cyan()),
            value.filter(|v| !v.is_empty()).unwrap_or("-")
        );
    };
    let id_text = entry.id.to_string();
    let disc = format!("{} of {}", entry.disc_number, entry.total_discs);
    row("Id", Some(&id_text));
    row("Status", Some(entry.status.as_str()));
    row("Media id", entry.media_id.as_deref());
    row("Version", entry.version.as_deref());
    row("Disc", Some(&disc));
    row("Regions", entry.regions.as_deref());
    row("ESRB", entry.esrb_rating.as_deref());
    row("Entry point", entry.entry_point.as_deref());
    row("Original PE name", entry.original_pe_name.as_deref());
    row("Created", Some(&entry.created_at));
    row("Updated", Some(&entry.updated_at));

    crate::log_blank();
    for field in PathField::ALL {
        row(field.column(), entry.path(field));
    }

    if let Some(info) = entry.xex_info() {
        crate::log_blank();
        row("Load address", Some(&info.load_address));
        let flags = format!(
            "{}, {}",
            if info.is_retail { "retail" } else { "devkit" },
            if info.is_encrypted { "encrypted" } else { "unencrypted" },
        );
        row("Flags", Some(&flags));
        if !info.static_libraries.is_empty() {
            row("Libraries", Some(&info.static_libraries.join(", ")));
        }
    }

    if !entry.title_id.is_empty() {
        let manager = WorkspaceManager::new(settings.ports_root.clone());
        let workspace = manager.find_existing(&entry.title_id)?;
        let root = workspace.map(|w| path_string(w.root()));
        crate::log_blank();
        row("Workspace", root.as_deref());
    }

    if let Some(notes) = entry.notes.as_deref().filter(|n| !n.is_empty()) {
        crate::log_blank();
        log::info!("  {}", "Notes:".if_supports_color(Stdout, |t| t.cyan()));
        for line in notes.lines() {
            log::info!("    {}", line);
        }
    }
    Ok(())
}

/// Entry point for `catalog status`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_catalog_status(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    id: i64,
    status: &str,
    notes: Option<String>,
    xex: Option<PathBuf>,
    iso: Option<PathBuf>,
) -> Result<(), CliError> {
    let status = parse_status(status)?;
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;

    let mut patch = StatusPatch::new();
    if let Some(notes) = notes {
        patch = patch.with_notes(notes);
    }
    if let Some(xex) = xex {
        patch = patch.with_path(PathField::XexPath, path_string(&xex));
    }
    if let Some(iso) = iso {
        patch = patch.with_path(PathField::IsoPath, path_string(&iso));
    }

    let updated = xex_porter_db::update_status(&conn, id, status, &patch)
        .map_err(|e| CliError::database(format!("Failed to update game {}: {}", id, e)))?;
    if !updated {
        return Err(CliError::not_found(format!("no game with id {}", id)));
    }
    log::info!(
        "Game {} is now {}",
        id,
        status.if_supports_color(Stdout, |t| t.bold()),
    );
    Ok(())
}

/// Entry point for `catalog delete`.
pub(crate) fn run_catalog_delete(
    config: Option<PathBuf>,
    db: Option<PathBuf>,
    id: i64,
    confirm: bool,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let conn = open_catalog(&settings, db)?;
    let entry = require_entry(&conn, id)?;

    if !confirm {
        log::warn!(
            "This will remove '{}' [{}] from the catalog.",
            entry.game_name,
            entry.title_id,
        );
        log::info!("Re-run with --confirm to proceed:");
        log::info!("  xex-porter catalog delete {} --confirm", id);
        return Ok(());
    }

    xex_porter_db::delete_game(&conn, id)
        .map_err(|e| CliError::database(format!("Failed to delete game {}: {}", id, e)))?;
    log::info!(
        "{}",
        format!("Deleted game {} ({}).", id, entry.game_name)
            .if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("  Its workspace directory, if any, was left in place.");
    Ok(())
}

/// Entry point for `catalog stats`.
pub(crate) fn run_catalog_stats(config: Option<PathBuf>, db: Option<PathBuf>) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let path = catalog_path(&settings, db.clone());
    let conn = open_catalog(&settings, db)?;

    let total = xex_porter_db::count_games(&conn, None)
        .map_err(|e| CliError::database(format!("Failed to count games: {}", e)))?;
    let counts = xex_porter_db::status_counts(&conn)
        .map_err(|e| CliError::database(format!("Failed to query status counts: {}", e)))?;

    log::info!(
        "{}",
        "Catalog Statistics".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("  Database: {}", path.display());
    crate::log_blank();
    for (status, count) in counts {
        log::info!("  {:<14} {:>6}", format!("{}:", status.as_str()), count);
    }
    log::info!("  {:<14} {:>6}", "total:", total);
    Ok(())
}
