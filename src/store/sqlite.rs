use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::collection::normalize;
use crate::core::{CardCategory, CommanderProfile, DeckCard, OwnedCard};
use crate::deck::{DeckCompositionTable, DeckKey};
use crate::error::{Result, ScoutError};
use crate::store::migrations::run_migrations;
use crate::store::{ScoutStore, StoreStats, UserRecord};

/// SQLite-backed store.
///
/// Commander and archetype lookups go through normalized key columns
/// (`commander_key`, `archetype_key`, `name_key`) so they are case-insensitive.
/// Deck rows keep their table position, so a reloaded table has the same
/// card order and count as the one saved.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

struct DeckRow {
    commander_key: String,
    archetype_key: String,
    commander_name: String,
    archetype_id: String,
    budget_range: Option<String>,
    card: DeckCard,
}

impl DeckRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let category: String = row.get(6)?;
        Ok(Self {
            commander_key: row.get(0)?,
            archetype_key: row.get(1)?,
            commander_name: row.get(2)?,
            archetype_id: row.get(3)?,
            budget_range: row.get(4)?,
            card: DeckCard {
                card_name: row.get(5)?,
                category: CardCategory::parse(&category),
                inclusion_rate: row.get(7)?,
                synergy_score: row.get(8)?,
                price_usd: row.get(9)?,
            },
        })
    }
}

const DECK_ROW_COLUMNS: &str = "commander_key, archetype_key, commander_name, archetype_id, budget_range,
     card_name, category, inclusion_rate, synergy_score, price_usd";

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn commander_from_row(row: &Row<'_>) -> rusqlite::Result<CommanderProfile> {
    let color_json: String = row.get(1)?;
    let themes_json: String = row.get(4)?;
    let total_decks: i64 = row.get(5)?;
    let popularity_rank: i64 = row.get(6)?;

    Ok(CommanderProfile {
        name: row.get(0)?,
        color_identity: serde_json::from_str(&color_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?,
        archetype: row.get(2)?,
        budget_range: row.get(3)?,
        themes: serde_json::from_str(&themes_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?,
        total_decks: total_decks.max(0) as u64,
        popularity_rank: popularity_rank.clamp(1, i64::from(u32::MAX)) as u32,
        avg_deck_price: row.get(7)?,
        salt_score: row.get(8)?,
        power_level: row.get(9)?,
    })
}

const COMMANDER_COLUMNS: &str = "name, color_identity, archetype, budget_range, themes,
     total_decks, popularity_rank, avg_deck_price, salt_score, power_level";

/// Group position-ordered rows into tables, skipping any that no longer validate
fn group_tables(rows: Vec<DeckRow>) -> Vec<DeckCompositionTable> {
    let mut tables = Vec::new();
    let mut current: Option<(DeckKey, String, String, Vec<DeckCard>)> = None;

    let mut flush = |entry: Option<(DeckKey, String, String, Vec<DeckCard>)>| {
        if let Some((key, _, _, cards)) = entry {
            match DeckCompositionTable::new(key.clone(), cards) {
                Ok(table) => tables.push(table),
                Err(e) => warn!("Skipping stored deck {}: {}", key, e),
            }
        }
    };

    for row in rows {
        let same_table = matches!(
            &current,
            Some((_, c, a, _)) if *c == row.commander_key && *a == row.archetype_key
        );
        if !same_table {
            let mut key = DeckKey::new(row.commander_name).with_archetype(row.archetype_id);
            if let Some(budget) = row.budget_range {
                key = key.with_budget_range(budget);
            }
            flush(current.replace((key, row.commander_key, row.archetype_key, Vec::new())));
        }
        if let Some((_, _, _, cards)) = current.as_mut() {
            cards.push(row.card);
        }
    }
    flush(current);

    tables
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`; `:memory:` gives a private in-memory store
    pub async fn new(db_path: &str) -> Result<Self> {
        let mut conn = if db_path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Connection::open(db_path)?
        };

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        run_migrations(&mut conn)?;
        debug!("Opened store at {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ScoutError::Other("store connection mutex poisoned".to_string()))
    }

    fn count(conn: &Connection, sql: &str) -> Result<u64> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }
}

#[async_trait]
impl ScoutStore for SqliteStore {
    async fn replace_collection(&self, user: &str, source: &str, cards: &[OwnedCard]) -> Result<usize> {
        let user_id = user.trim();
        if user_id.is_empty() {
            return Err(ScoutError::InvalidInput("user cannot be empty".to_string()));
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO users (user_id, source, last_sync_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET source = excluded.source, last_sync_at = excluded.last_sync_at",
            params![user_id, source, Utc::now().to_rfc3339()],
        )?;
        tx.execute("DELETE FROM user_collections WHERE user_id = ?", params![user_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO user_collections (user_id, card_name, quantity, foil_quantity)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for card in cards {
                stmt.execute(params![user_id, card.card_name, card.quantity, card.foil_quantity])?;
            }
        }
        tx.commit()?;

        info!("Stored {} collection rows for {} from {}", cards.len(), user_id, source);
        Ok(cards.len())
    }

    async fn load_collection(&self, user: &str) -> Result<Vec<OwnedCard>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT card_name, quantity, foil_quantity FROM user_collections
             WHERE user_id = ? ORDER BY id",
        )?;
        let cards = stmt
            .query_map(params![user.trim()], |row| {
                Ok(OwnedCard::new(
                    row.get::<_, String>(0)?,
                    row.get(1)?,
                    row.get(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    async fn save_deck_table(&self, table: &DeckCompositionTable) -> Result<()> {
        let commander_key = normalize(table.commander());
        let archetype_key = normalize(table.archetype());
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM deck_card_inclusions WHERE commander_key = ?1 AND archetype_key = ?2",
            params![commander_key, archetype_key],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO deck_card_inclusions (
                    commander_key, archetype_key, position, commander_name, archetype_id, budget_range,
                    card_name, inclusion_rate, synergy_score, category, price_usd, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for (position, card) in table.cards().iter().enumerate() {
                stmt.execute(params![
                    commander_key,
                    archetype_key,
                    position as i64,
                    table.commander(),
                    table.archetype(),
                    table.key().budget_range,
                    card.card_name,
                    card.inclusion_rate,
                    card.synergy_score,
                    card.category.as_str(),
                    card.price_usd,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved deck {} ({} cards)", table.key(), table.total_cards());
        Ok(())
    }

    async fn load_deck_table(&self, commander: &str, archetype: &str) -> Result<Option<DeckCompositionTable>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM deck_card_inclusions
             WHERE commander_key = ?1 AND archetype_key = ?2 ORDER BY position",
            DECK_ROW_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![normalize(commander), normalize(archetype)], DeckRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if rows.is_empty() {
            return Ok(None);
        }
        let first = &rows[0];
        let mut key = DeckKey::new(first.commander_name.clone()).with_archetype(first.archetype_id.clone());
        if let Some(budget) = &first.budget_range {
            key = key.with_budget_range(budget.clone());
        }
        let cards = rows.into_iter().map(|r| r.card).collect();

        DeckCompositionTable::new(key, cards).map(Some)
    }

    async fn load_deck_tables(&self) -> Result<Vec<DeckCompositionTable>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM deck_card_inclusions ORDER BY commander_key, archetype_key, position",
            DECK_ROW_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], DeckRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(group_tables(rows))
    }

    async fn list_deck_keys(&self) -> Result<Vec<DeckKey>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT commander_name, archetype_id, budget_range FROM deck_card_inclusions
             WHERE position = 0 ORDER BY commander_key, archetype_key",
        )?;
        let keys = stmt
            .query_map([], |row| {
                let mut key = DeckKey::new(row.get::<_, String>(0)?).with_archetype(row.get::<_, String>(1)?);
                if let Some(budget) = row.get::<_, Option<String>>(2)? {
                    key = key.with_budget_range(budget);
                }
                Ok(key)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    async fn save_commander(&self, profile: &CommanderProfile) -> Result<()> {
        profile.validate()?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO commanders (
                name_key, name, color_identity, archetype, budget_range, themes,
                total_decks, popularity_rank, avg_deck_price, salt_score, power_level, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(name_key) DO UPDATE SET
                name = excluded.name,
                color_identity = excluded.color_identity,
                archetype = excluded.archetype,
                budget_range = excluded.budget_range,
                themes = excluded.themes,
                total_decks = excluded.total_decks,
                popularity_rank = excluded.popularity_rank,
                avg_deck_price = excluded.avg_deck_price,
                salt_score = excluded.salt_score,
                power_level = excluded.power_level,
                updated_at = excluded.updated_at",
            params![
                normalize(&profile.name),
                profile.name,
                serde_json::to_string(&profile.color_identity)?,
                profile.archetype,
                profile.budget_range,
                serde_json::to_string(&profile.themes)?,
                i64::try_from(profile.total_decks).unwrap_or(i64::MAX),
                profile.popularity_rank,
                profile.avg_deck_price,
                profile.salt_score,
                profile.power_level,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn load_commanders(&self) -> Result<Vec<CommanderProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM commanders ORDER BY popularity_rank, name",
            COMMANDER_COLUMNS
        ))?;
        let commanders = stmt
            .query_map([], commander_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(commanders)
    }

    async fn find_commander(&self, name: &str) -> Result<Option<CommanderProfile>> {
        let conn = self.conn()?;
        let profile = conn
            .query_row(
                &format!("SELECT {} FROM commanders WHERE name_key = ?", COMMANDER_COLUMNS),
                params![normalize(name)],
                commander_from_row,
            )
            .optional()?;
        Ok(profile)
    }

    async fn find_user(&self, user: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT user_id, source, last_sync_at FROM users WHERE user_id = ?",
                params![user.trim()],
                |row| {
                    let last_sync: Option<String> = row.get(2)?;
                    Ok(UserRecord {
                        user_id: row.get(0)?,
                        source: row.get(1)?,
                        last_sync: last_sync.as_deref().and_then(parse_timestamp),
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;

        let last_sync: Option<String> =
            conn.query_row("SELECT MAX(last_sync_at) FROM users", [], |row| row.get(0))?;

        Ok(StoreStats {
            users: Self::count(&conn, "SELECT COUNT(*) FROM users")?,
            collection_rows: Self::count(&conn, "SELECT COUNT(*) FROM user_collections")?,
            commanders: Self::count(&conn, "SELECT COUNT(*) FROM commanders")?,
            deck_tables: Self::count(
                &conn,
                "SELECT COUNT(*) FROM (SELECT DISTINCT commander_key, archetype_key FROM deck_card_inclusions)",
            )?,
            deck_cards: Self::count(&conn, "SELECT COUNT(*) FROM deck_card_inclusions")?,
            last_sync: last_sync.as_deref().and_then(parse_timestamp),
        })
    }
}
