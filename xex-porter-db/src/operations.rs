//! Write operations on the `games` table.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use thiserror::Error;
use xex_porter_catalog::{CatalogEntry, GameStatus, PathField, StatusPatch, path_string};

use crate::queries::find_id_by_title_id;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
}

/// Result of [`upsert_game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    /// `true` when a new row was inserted.
    pub created: bool,
}

// ── Game Operations ─────────────────────────────────────────────────────────

/// Insert a new row unconditionally. Returns the generated id.
pub fn insert_game(conn: &Connection, entry: &CatalogEntry) -> Result<i64, OperationError> {
    conn.execute(
        "INSERT INTO games (title_id, game_name, status, iso_path, extracted_dir, xex_path,
                            analysis_json, project_toml, notes, media_id, version,
                            disc_number, total_discs, regions, esrb_rating, entry_point,
                            original_pe_name, xex_info_json)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            title_id_param(&entry.title_id),
            entry.game_name,
            entry.status.as_str(),
            entry.iso_path,
            entry.extracted_dir,
            entry.xex_path,
            entry.analysis_json,
            entry.project_toml,
            entry.notes,
            entry.media_id,
            entry.version,
            entry.disc_number,
            entry.total_discs,
            entry.regions,
            entry.esrb_rating,
            entry.entry_point,
            entry.original_pe_name,
            entry.xex_info_json,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert or merge a title by its title id.
///
/// When `entry.title_id` is non-empty and already stored, that row is
/// updated in place and keeps its id. Optional fields that are `None` in
/// `entry` keep their stored values, an empty `game_name` keeps the stored
/// name, and `status` is always overwritten. Entries without a title id are
/// always inserted.
pub fn upsert_game(conn: &Connection, entry: &CatalogEntry) -> Result<UpsertOutcome, OperationError> {
    let existing = if entry.title_id.is_empty() {
        None
    } else {
        find_id_by_title_id(conn, &entry.title_id)?
    };

    let Some(id) = existing else {
        let id = insert_game(conn, entry)?;
        log::debug!("Inserted catalog entry {} for '{}'", id, entry.title_id);
        return Ok(UpsertOutcome { id, created: true });
    };

    conn.execute(
        "UPDATE games SET
             game_name = CASE WHEN ?2 = '' THEN game_name ELSE ?2 END,
             status = ?3,
             iso_path = COALESCE(?4, iso_path),
             extracted_dir = COALESCE(?5, extracted_dir),
             xex_path = COALESCE(?6, xex_path),
             analysis_json = COALESCE(?7, analysis_json),
             project_toml = COALESCE(?8, project_toml),
             notes = COALESCE(?9, notes),
             media_id = COALESCE(?10, media_id),
             version = COALESCE(?11, version),
             disc_number = ?12,
             total_discs = ?13,
             regions = COALESCE(?14, regions),
             esrb_rating = COALESCE(?15, esrb_rating),
             entry_point = COALESCE(?16, entry_point),
             original_pe_name = COALESCE(?17, original_pe_name),
             xex_info_json = COALESCE(?18, xex_info_json),
             updated_at = datetime('now')
         WHERE id = ?1",
        params![
            id,
            entry.game_name,
            entry.status.as_str(),
            entry.iso_path,
            entry.extracted_dir,
            entry.xex_path,
            entry.analysis_json,
            entry.project_toml,
            entry.notes,
            entry.media_id,
            entry.version,
            entry.disc_number,
            entry.total_discs,
            entry.regions,
            entry.esrb_rating,
            entry.entry_point,
            entry.original_pe_name,
            entry.xex_info_json,
        ],
    )?;
    log::debug!("Updated catalog entry {} for '{}'", id, entry.title_id);
    Ok(UpsertOutcome { id, created: false })
}

/// Overwrite every column of an existing row with `entry`.
pub fn update_game(conn: &Connection, entry: &CatalogEntry) -> Result<(), OperationError> {
    let changed = conn.execute(
        "UPDATE games SET
             title_id = ?2, game_name = ?3, status = ?4,
             iso_path = ?5, extracted_dir = ?6, xex_path = ?7,
             analysis_json = ?8, project_toml = ?9, notes = ?10,
             media_id = ?11, version = ?12, disc_number = ?13, total_discs = ?14,
             regions = ?15, esrb_rating = ?16, entry_point = ?17,
             original_pe_name = ?18, xex_info_json = ?19,
             updated_at = datetime('now')
         WHERE id = ?1",
        params![
            entry.id,
            title_id_param(&entry.title_id),
            entry.game_name,
            entry.status.as_str(),
            entry.iso_path,
            entry.extracted_dir,
            entry.xex_path,
            entry.analysis_json,
            entry.project_toml,
            entry.notes,
            entry.media_id,
            entry.version,
            entry.disc_number,
            entry.total_discs,
            entry.regions,
            entry.esrb_rating,
            entry.entry_point,
            entry.original_pe_name,
            entry.xex_info_json,
        ],
    )?;
    if changed == 0 {
        return Err(not_found(entry.id));
    }
    Ok(())
}

/// Set the status of a row, together with any fields present in `patch`.
///
/// Returns `false` when no row has this id.
pub fn update_status(
    conn: &Connection,
    id: i64,
    status: GameStatus,
    patch: &StatusPatch,
) -> Result<bool, OperationError> {
    let mut columns: Vec<(&str, Value)> = vec![("status", Value::Text(status.as_str().to_string()))];
    columns.extend(
        patch
            .columns()
            .into_iter()
            .map(|(column, value)| (column, Value::Text(value.to_string()))),
    );
    update_columns(conn, id, &columns)
}

/// Store the artifact paths returned by a workspace sync.
///
/// Returns `false` when no row has this id.
pub fn apply_paths(
    conn: &Connection,
    id: i64,
    paths: &BTreeMap<PathField, PathBuf>,
) -> Result<bool, OperationError> {
    let columns: Vec<(&str, Value)> = paths
        .iter()
        .map(|(field, path)| (field.column(), Value::Text(path_string(path))))
        .collect();
    update_columns(conn, id, &columns)
}

/// Delete a row. Returns `false` when no row has this id.
pub fn delete_game(conn: &Connection, id: i64) -> Result<bool, OperationError> {
    let changed = conn.execute("DELETE FROM games WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// `UPDATE games SET <columns>, updated_at = now WHERE id = ?`.
///
/// Column names come from a fixed set and are never user input.
fn update_columns(conn: &Connection, id: i64, columns: &[(&str, Value)]) -> Result<bool, OperationError> {
    let mut assignments: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .collect();
    assignments.push("updated_at = datetime('now')".to_string());

    let sql = format!(
        "UPDATE games SET {} WHERE id = ?{}",
        assignments.join(", "),
        columns.len() + 1
    );

    let mut values: Vec<Value> = columns.iter().map(|(_, v)| v.clone()).collect();
    values.push(Value::Integer(id));

    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed > 0)
}

/// Empty title ids are stored as NULL so they never collide.
fn title_id_param(title_id: &str) -> Option<&str> {
    if title_id.is_empty() { None } else { Some(title_id) }
}

fn not_found(id: i64) -> OperationError {
    OperationError::NotFound {
        entity_type: "game".to_string(),
        id: id.to_string(),
    }
}
