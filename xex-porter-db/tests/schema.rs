use xex_porter_db::schema::{CURRENT_VERSION, create_schema, get_schema_version};
use xex_porter_db::{add_column_if_missing, open_database, open_memory};

fn column_names(conn: &rusqlite::Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(games)").unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn create_schema_in_memory() {
    let conn = open_memory().unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}

#[test]
fn schema_is_idempotent() {
    let conn = open_memory().unwrap();
    // Creating again should not error
    create_schema(&conn).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}

#[test]
fn games_table_has_all_columns() {
    let conn = open_memory().unwrap();
    let columns = column_names(&conn);
    for expected in [
        "id",
        "title_id",
        "game_name",
        "status",
        "created_at",
        "updated_at",
        "iso_path",
        "extracted_dir",
        "xex_path",
        "analysis_json",
        "project_toml",
        "notes",
        "media_id",
        "version",
        "disc_number",
        "total_discs",
        "regions",
        "esrb_rating",
        "entry_point",
        "original_pe_name",
        "xex_info_json",
    ] {
        assert!(columns.iter().any(|c| c == expected), "missing column {}", expected);
    }
}

#[test]
fn indexes_exist() {
    let conn = open_memory().unwrap();
    for index in ["idx_games_status", "idx_games_title_id"] {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1)",
                [index],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists, "index {} not found", index);
    }
}

#[test]
fn add_column_if_missing_is_noop_for_existing_column() {
    let conn = open_memory().unwrap();
    assert!(!add_column_if_missing(&conn, "games", "notes", "TEXT").unwrap());
    assert!(add_column_if_missing(&conn, "games", "extra_field", "TEXT").unwrap());
    assert!(!add_column_if_missing(&conn, "games", "extra_field", "TEXT").unwrap());
    assert!(column_names(&conn).iter().any(|c| c == "extra_field"));
}

#[test]
fn open_database_creates_file_and_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("games.db");
    let conn = open_database(&path).unwrap();
    assert!(path.exists());
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}

#[test]
fn reopen_keeps_data() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("games.db");
    {
        let conn = open_database(&path).unwrap();
        conn.execute(
            "INSERT INTO games (title_id, game_name) VALUES ('4E4D07F5', 'Dead To Rights')",
            [],
        )
        .unwrap();
    }
    let conn = open_database(&path).unwrap();
    let name: String = conn
        .query_row("SELECT game_name FROM games WHERE title_id = '4E4D07F5'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Dead To Rights");
}

#[test]
fn unversioned_legacy_table_is_migrated() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("legacy.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE games (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 title_id TEXT UNIQUE,
                 game_name TEXT NOT NULL,
                 status TEXT DEFAULT 'pending',
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                 updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                 iso_path TEXT,
                 notes TEXT
             );
             INSERT INTO games (title_id, game_name, notes) VALUES ('4D5307E6', 'Halo 3', 'old notes');",
        )
        .unwrap();
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);

    let columns = column_names(&conn);
    for expected in ["extracted_dir", "xex_path", "project_toml", "media_id", "xex_info_json"] {
        assert!(columns.iter().any(|c| c == expected), "missing column {}", expected);
    }

    let entry = xex_porter_db::get_game_by_title_id(&conn, "4D5307E6").unwrap().unwrap();
    assert_eq!(entry.game_name, "Halo 3");
    assert_eq!(entry.notes.as_deref(), Some("old notes"));
    assert_eq!(entry.disc_number, 1);
}

#[test]
fn version_one_database_gains_identity_columns() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("v1.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (
                 version INTEGER NOT NULL,
                 applied_at TEXT NOT NULL DEFAULT (datetime('now'))
             );
             INSERT INTO schema_version (version) VALUES (1);
             CREATE TABLE games (
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
                 notes TEXT
             );",
        )
        .unwrap();
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), 2);
    let columns = column_names(&conn);
    assert!(columns.iter().any(|c| c == "original_pe_name"));
    assert!(columns.iter().any(|c| c == "total_discs"));
}

#[test]
fn newer_schema_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("future.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_version (version INTEGER NOT NULL, applied_at TEXT);
             INSERT INTO schema_version (version) VALUES (99);",
        )
        .unwrap();
    }
    let err = open_database(&path).unwrap_err();
    assert!(matches!(
        err,
        xex_porter_db::SchemaError::VersionMismatch { found: 99, .. }
    ));
}
