pub(crate) mod analyse;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod pipeline;
pub(crate) mod profiles;
pub(crate) mod toml;
pub(crate) mod workspace;

use std::path::PathBuf;

use rusqlite::Connection;
use xex_porter_catalog::CatalogEntry;
use xex_porter_lib::Settings;

use crate::CliError;

/// Resolve settings from `--config` or the default location.
pub(crate) fn load_settings(config: Option<PathBuf>) -> Result<Settings, CliError> {
    let settings = match config {
        Some(path) => Settings::load_from(&path),
        None => Settings::load(),
    };
    settings.map_err(|e| CliError::config(e.to_string()))
}

/// The catalog path: `--db` wins over settings.
pub(crate) fn catalog_path(settings: &Settings, db: Option<PathBuf>) -> PathBuf {
    db.unwrap_or_else(|| settings.database.clone())
}

/// Open (creating if needed) the catalog database.
pub(crate) fn open_catalog(settings: &Settings, db: Option<PathBuf>) -> Result<Connection, CliError> {
    let path = catalog_path(settings, db);
    log::debug!("Opening catalog {}", path.display());
    xex_porter_db::open_database(&path)
        .map_err(|e| CliError::database(format!("Failed to open catalog {}: {}", path.display(), e)))
}

/// Load one catalog row or fail with `NotFound`.
pub(crate) fn require_entry(conn: &Connection, id: i64) -> Result<CatalogEntry, CliError> {
    xex_porter_db::get_game(conn, id)
        .map_err(|e| CliError::database(format!("Failed to read game {}: {}", id, e)))?
        .ok_or_else(|| CliError::not_found(format!("no game with id {}", id)))
}

/// Truncate a string to a maximum width in characters, appending "..." if needed.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max).collect()
    }
}
