pub mod migrations;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::{CommanderProfile, OwnedCard};
use crate::deck::{DeckCompositionTable, DeckKey};
use crate::error::Result;

pub use sqlite::SqliteStore;

/// Persistence for collections, deck statistics and commander metadata
#[async_trait]
pub trait ScoutStore: Send + Sync {
    /// Replace everything stored for `user` with `cards`; returns rows written
    async fn replace_collection(&self, user: &str, source: &str, cards: &[OwnedCard]) -> Result<usize>;

    /// Stored rows for `user`, empty when the user is unknown
    async fn load_collection(&self, user: &str) -> Result<Vec<OwnedCard>>;

    /// Save a deck table, replacing any table with the same commander and archetype
    async fn save_deck_table(&self, table: &DeckCompositionTable) -> Result<()>;

    /// Case-insensitive lookup by commander and archetype
    async fn load_deck_table(&self, commander: &str, archetype: &str) -> Result<Option<DeckCompositionTable>>;

    /// Every stored deck table
    async fn load_deck_tables(&self) -> Result<Vec<DeckCompositionTable>>;

    async fn list_deck_keys(&self) -> Result<Vec<DeckKey>>;

    /// Insert or update by (case-insensitive) name
    async fn save_commander(&self, profile: &CommanderProfile) -> Result<()>;

    async fn load_commanders(&self) -> Result<Vec<CommanderProfile>>;

    async fn find_commander(&self, name: &str) -> Result<Option<CommanderProfile>>;

    /// Sync record for `user`, `None` before the first sync
    async fn find_user(&self, user: &str) -> Result<Option<UserRecord>>;

    /// Get store statistics
    async fn stats(&self) -> Result<StoreStats>;
}

/// Where and when a user's collection was last synced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub source: String,
    pub last_sync: Option<DateTime<Utc>>,
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub users: u64,
    pub collection_rows: u64,
    pub commanders: u64,
    pub deck_tables: u64,
    pub deck_cards: u64,
    pub last_sync: Option<DateTime<Utc>>,
}
