pub mod csv_import;
pub mod edhrec;
pub mod http;
pub mod moxfield;
pub mod rate_limiter;
pub mod static_data;

use async_trait::async_trait;

use crate::core::{CommanderProfile, OwnedCard};
use crate::deck::DeckCompositionTable;
use crate::error::Result;

pub use csv_import::MoxfieldCsvImporter;
pub use edhrec::EdhrecClient;
pub use http::HttpSettings;
pub use moxfield::MoxfieldClient;
pub use rate_limiter::RateLimiter;
pub use static_data::StaticDeckSource;

/// Source of a user's owned cards (Moxfield API, CSV export, ...)
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Full collection for `user`; callers replace any stored copy with it
    async fn fetch_collection(&self, user: &str) -> Result<Vec<OwnedCard>>;

    /// Get source name
    fn name(&self) -> &str;
}

/// Source of per-commander deck statistics (EDHREC, static dataset, ...)
#[async_trait]
pub trait DeckStatsSource: Send + Sync {
    /// Deck composition for a commander; `None` archetype means the default list
    async fn fetch_deck(&self, commander: &str, archetype: Option<&str>) -> Result<DeckCompositionTable>;

    /// Commander metadata, when the source has any
    async fn commander_profile(&self, _commander: &str) -> Result<Option<CommanderProfile>> {
        Ok(None)
    }

    /// Known commanders, most popular first
    async fn list_commanders(&self, limit: usize) -> Result<Vec<CommanderProfile>>;

    /// Get source name
    fn name(&self) -> &str;
}
