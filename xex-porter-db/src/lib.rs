//! SQLite persistence layer for the title catalog.
//!
//! Provides schema creation and migration, write operations, and query
//! APIs over the single `games` table (via rusqlite with the bundled
//! feature).

pub mod operations;
pub mod queries;
pub mod schema;

pub use operations::{
    OperationError, UpsertOutcome, apply_paths, delete_game, insert_game, update_game,
    update_status, upsert_game,
};
pub use queries::{
    count_games, get_game, get_game_by_title_id, list_games, search_games, status_counts,
};
pub use schema::{SchemaError, add_column_if_missing, open_database, open_memory};
