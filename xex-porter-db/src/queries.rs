//! Read queries for the catalog database.

use rusqlite::{Connection, Row, params};
use xex_porter_catalog::{CatalogEntry, GameStatus};

use crate::operations::OperationError;

const GAME_COLUMNS: &str = "id, title_id, game_name, status, created_at, updated_at,
    iso_path, extracted_dir, xex_path, analysis_json, project_toml, notes,
    media_id, version, disc_number, total_discs, regions, esrb_rating,
    entry_point, original_pe_name, xex_info_json";

// ── Game Lookups ────────────────────────────────────────────────────────────

/// Fetch a single row by id.
pub fn get_game(conn: &Connection, id: i64) -> Result<Option<CatalogEntry>, OperationError> {
    let sql = format!("SELECT {} FROM games WHERE id = ?1", GAME_COLUMNS);
    let result = conn.query_row(&sql, params![id], row_to_entry);
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch a single row by title id.
pub fn get_game_by_title_id(
    conn: &Connection,
    title_id: &str,
) -> Result<Option<CatalogEntry>, OperationError> {
    let sql = format!("SELECT {} FROM games WHERE title_id = ?1", GAME_COLUMNS);
    let result = conn.query_row(&sql, params![title_id], row_to_entry);
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn find_id_by_title_id(conn: &Connection, title_id: &str) -> Result<Option<i64>, OperationError> {
    let result = conn.query_row(
        "SELECT id FROM games WHERE title_id = ?1 LIMIT 1",
        params![title_id],
        |row| row.get::<_, i64>(0),
    );
    match result {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List rows, most recently updated first, optionally filtered by status.
pub fn list_games(
    conn: &Connection,
    status: Option<GameStatus>,
    limit: usize,
) -> Result<Vec<CatalogEntry>, OperationError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    match status {
        Some(status) => {
            let sql = format!(
                "SELECT {} FROM games WHERE status = ?1
                 ORDER BY updated_at DESC, id DESC LIMIT ?2",
                GAME_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![status.as_str(), limit], row_to_entry)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        }
        None => {
            let sql = format!(
                "SELECT {} FROM games ORDER BY updated_at DESC, id DESC LIMIT ?1",
                GAME_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit], row_to_entry)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
        }
    }
}

/// Search by substring of game name or title id (case-insensitive LIKE).
/// `%` and `_` in `term` match themselves.
pub fn search_games(conn: &Connection, term: &str) -> Result<Vec<CatalogEntry>, OperationError> {
    let pattern = format!("%{}%", escape_like(term));
    let sql = format!(
        "SELECT {} FROM games
         WHERE game_name LIKE ?1 ESCAPE '\\' OR title_id LIKE ?1 ESCAPE '\\'
         ORDER BY game_name, id",
        GAME_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Count rows, optionally only those with `status`.
pub fn count_games(conn: &Connection, status: Option<GameStatus>) -> Result<i64, OperationError> {
    let count: i64 = match status {
        Some(status) => conn.query_row(
            "SELECT COUNT(*) FROM games WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?,
    };
    Ok(count)
}

/// Row counts per stored status, for a catalog summary.
pub fn status_counts(conn: &Connection) -> Result<Vec<(GameStatus, i64)>, OperationError> {
    GameStatus::ALL
        .iter()
        .map(|status| count_games(conn, Some(*status)).map(|n| (*status, n)))
        .collect()
}

// ── Row Mapping ─────────────────────────────────────────────────────────────

fn row_to_entry(row: &Row) -> rusqlite::Result<CatalogEntry> {
    let status: Option<String> = row.get(3)?;
    Ok(CatalogEntry {
        id: row.get(0)?,
        title_id: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        game_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        status: status.as_deref().map(GameStatus::from_str_loose).unwrap_or_default(),
        created_at: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        updated_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        iso_path: row.get(6)?,
        extracted_dir: row.get(7)?,
        xex_path: row.get(8)?,
        analysis_json: row.get(9)?,
        project_toml: row.get(10)?,
        notes: row.get(11)?,
        media_id: row.get(12)?,
        version: row.get(13)?,
        disc_number: row.get::<_, Option<i64>>(14)?.unwrap_or(1),
        total_discs: row.get::<_, Option<i64>>(15)?.unwrap_or(1),
        regions: row.get(16)?,
        esrb_rating: row.get(17)?,
        entry_point: row.get(18)?,
        original_pe_name: row.get(19)?,
        xex_info_json: row.get(20)?,
    })
}
