//! Versioned schema for the SQLite store

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::Result;

const MIGRATIONS: [(i64, &str, &str); 4] = [
    (1, "users", CREATE_USERS_TABLE),
    (2, "user_collections", CREATE_USER_COLLECTIONS_TABLE),
    (3, "commanders", CREATE_COMMANDERS_TABLE),
    (4, "deck_card_inclusions", CREATE_DECK_CARD_INCLUSIONS_TABLE),
];

/// Apply every migration not yet recorded in `schema_migrations`
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let mut applied = 0;
    for (version, name, sql) in MIGRATIONS {
        if run_migration(conn, version, name, sql)? {
            applied += 1;
        }
    }

    if applied > 0 {
        info!("Applied {} database migrations", applied);
    }
    Ok(applied)
}

/// Current schema version, 0 for an empty database
pub fn schema_version(conn: &Connection) -> Result<i64> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn run_migration(conn: &mut Connection, version: i64, name: &str, sql: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?)",
        [version],
        |row| row.get(0),
    )?;
    if exists {
        return Ok(false);
    }

    debug!("Running migration {:03}_{}", version, name);
    let tx = conn.transaction()?;
    tx.execute_batch(sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
        params![version, name],
    )?;
    tx.commit()?;

    Ok(true)
}

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE users (
    user_id TEXT PRIMARY KEY,
    source TEXT NOT NULL,
    last_sync_at TEXT NOT NULL
);
"#;

const CREATE_USER_COLLECTIONS_TABLE: &str = r#"
CREATE TABLE user_collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    card_name TEXT NOT NULL,
    quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0),
    foil_quantity INTEGER NOT NULL DEFAULT 0 CHECK (foil_quantity >= 0)
);
CREATE INDEX idx_user_collections_user ON user_collections(user_id);
"#;

const CREATE_COMMANDERS_TABLE: &str = r#"
CREATE TABLE commanders (
    name_key TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    color_identity TEXT NOT NULL DEFAULT '[]',
    archetype TEXT,
    budget_range TEXT,
    themes TEXT NOT NULL DEFAULT '[]',
    total_decks INTEGER NOT NULL DEFAULT 0,
    popularity_rank INTEGER NOT NULL DEFAULT 500,
    avg_deck_price REAL NOT NULL DEFAULT 0,
    salt_score REAL NOT NULL DEFAULT 0,
    power_level REAL NOT NULL DEFAULT 5,
    updated_at TEXT NOT NULL
);
"#;

const CREATE_DECK_CARD_INCLUSIONS_TABLE: &str = r#"
CREATE TABLE deck_card_inclusions (
    commander_key TEXT NOT NULL,
    archetype_key TEXT NOT NULL,
    position INTEGER NOT NULL,
    commander_name TEXT NOT NULL,
    archetype_id TEXT NOT NULL,
    budget_range TEXT,
    card_name TEXT NOT NULL,
    inclusion_rate REAL NOT NULL,
    synergy_score REAL NOT NULL DEFAULT 0,
    category TEXT NOT NULL,
    price_usd REAL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (commander_key, archetype_key, position)
);
"#;
