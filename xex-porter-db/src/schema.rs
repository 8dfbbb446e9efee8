//! SQLite schema creation and migration.

use rusqlite::{Connection, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Columns of the original `games` table (version 1).
const BASE_COLUMNS: &[(&str, &str)] = &[
    ("title_id", "TEXT"),
    ("game_name", "TEXT NOT NULL DEFAULT ''"),
    ("status", "TEXT NOT NULL DEFAULT 'pending'"),
    ("created_at", "TEXT"),
    ("updated_at", "TEXT"),
    ("iso_path", "TEXT"),
    ("extracted_dir", "TEXT"),
    ("xex_path", "TEXT"),
    ("analysis_json", "TEXT"),
    ("project_toml", "TEXT"),
    ("notes", "TEXT"),
];

/// Identity columns added in version 2.
const IDENTITY_COLUMNS: &[(&str, &str)] = &[
    ("media_id", "TEXT"),
    ("version", "TEXT"),
    ("disc_number", "INTEGER NOT NULL DEFAULT 1"),
    ("total_discs", "INTEGER NOT NULL DEFAULT 1"),
    ("regions", "TEXT"),
    ("esrb_rating", "TEXT"),
    ("entry_point", "TEXT"),
    ("original_pe_name", "TEXT"),
    ("xex_info_json", "TEXT"),
];

/// Create all tables and indexes if they don't exist.
///
/// Idempotent. A `games` table left by an older, unversioned build is
/// brought up to date column by column; no data is dropped.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    for (column, decl) in BASE_COLUMNS.iter().chain(IDENTITY_COLUMNS) {
        add_column_if_missing(conn, "games", column, decl)?;
    }
    conn.execute_batch(INDEX_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a catalog database at the given path.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version < CURRENT_VERSION {
        migrate(&conn, version)?;
    } else if version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: version,
        });
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Add `column` to `table` unless it is already there.
///
/// Returns `true` when the column was added.
pub fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<bool, SchemaError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if existing.iter().any(|c| c.eq_ignore_ascii_case(column)) {
        return Ok(false);
    }

    conn.execute_batch(&format!("ALTER TABLE {} ADD COLUMN {} {};", table, column, decl))?;
    log::debug!("Added column {}.{}", table, column);
    Ok(true)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        params![version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: from_version,
        });
    }

    let mut version = from_version;
    while version < CURRENT_VERSION {
        match version {
            1 => {
                for (column, decl) in IDENTITY_COLUMNS {
                    add_column_if_missing(conn, "games", column, decl)?;
                }
            }
            _ => {}
        }
        version += 1;
        set_schema_version(conn, version)?;
        log::info!("Migrated catalog schema to version {}", version);
    }
    conn.execute_batch(INDEX_SQL)?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per processed title
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title_id TEXT UNIQUE,
    game_name TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    iso_path TEXT,
    extracted_dir TEXT,
    xex_path TEXT,
    analysis_json TEXT,
    project_toml TEXT,
    notes TEXT,
    media_id TEXT,
    version TEXT,
    disc_number INTEGER NOT NULL DEFAULT 1,
    total_discs INTEGER NOT NULL DEFAULT 1,
    regions TEXT,
    esrb_rating TEXT,
    entry_point TEXT,
    original_pe_name TEXT,
    xex_info_json TEXT
);
"#;

const INDEX_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_games_status ON games(status);
CREATE INDEX IF NOT EXISTS idx_games_title_id ON games(title_id);
"#;
