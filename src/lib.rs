//! # Commander Scout
//!
//! Matches a Magic: The Gathering collection against Commander deck
//! statistics and ranks the decks a player could build:
//! - Buildability scoring with per-card impact and purchase priority
//! - Recommendation ranking across commanders and archetypes
//! - Collection sources: Moxfield API, Moxfield CSV export
//! - Deck statistics sources: EDHREC JSON pages, static JSON datasets
//! - SQLite persistence with versioned migrations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use commander_scout::{RankingOptions, ScoringConfig, ScoutEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = ScoutEngine::open("scout.db", ScoringConfig::default()).await?;
//!     engine.import_csv("alice", "moxfield_export.csv").await?;
//!
//!     for rec in engine.recommend("alice", &RankingOptions::default()).await? {
//!         println!(
//!             "{} ({}) - {} complete, {}",
//!             rec.deck.commander_name,
//!             rec.deck.archetype,
//!             rec.deck.completion_display(),
//!             rec.deck.buildability_display()
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod config;
pub mod core;
pub mod deck;
pub mod engine;
pub mod error;
pub mod providers;
pub mod ranking;
pub mod scoring;
pub mod store;

// Re-export primary types
pub use collection::CollectionIndex;
pub use config::AppConfig;
pub use core::{
    CardCategory, CommanderProfile, DeckCard, MissingCardEntry, OwnedCard, PriorityLevel, ScoredDeck,
};
pub use deck::{DeckCompositionTable, DeckKey};
pub use engine::{BatchRefreshReport, CollectionSummary, ScoutEngine, SyncReport};
pub use error::{Result, ScoutError};
pub use ranking::{RankedDeck, RankingOptions, RecommendationRanker, SortKey};
pub use scoring::{BuildabilityScorer, ScoringConfig};
pub use store::{ScoutStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
