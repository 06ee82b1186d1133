use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::collection::{normalize, CollectionIndex};
use crate::core::{CommanderProfile, ScoredDeck};
use crate::deck::{DeckCompositionTable, DEFAULT_ARCHETYPE};
use crate::error::{Result, ScoutError};
use crate::providers::{CollectionSource, DeckStatsSource, MoxfieldCsvImporter, StaticDeckSource};
use crate::ranking::{RankedDeck, RankingOptions, RecommendationRanker};
use crate::scoring::{BuildabilityScorer, ScoringConfig};
use crate::store::{ScoutStore, SqliteStore};

const MAX_SUGGESTIONS: usize = 3;
const MIN_SUGGESTION_SIMILARITY: f64 = 0.6;

/// Main orchestrator: moves data from sources into the store and scores it
pub struct ScoutEngine {
    store: Arc<dyn ScoutStore>,
    scorer: BuildabilityScorer,
    ranker: RecommendationRanker,
    collection_sources: Vec<Arc<dyn CollectionSource>>,
    deck_sources: Vec<Arc<dyn DeckStatsSource>>,
}

/// Outcome of a collection sync or import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub user: String,
    pub source: String,
    /// Rows as delivered by the source
    pub rows: usize,
    /// Distinct normalized card names
    pub unique_cards: usize,
    pub total_quantity: u64,
}

/// Outcome of loading a deck dataset into the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetReport {
    pub commanders: usize,
    pub decks: usize,
}

/// Outcome of refreshing the most popular commanders from a deck source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRefreshReport {
    pub source: String,
    /// Commanders returned by the listing
    pub listed: usize,
    /// Deck tables fetched and stored
    pub refreshed: usize,
    /// Commanders whose deck fetch or save failed
    pub failed: Vec<String>,
}

/// What is stored for one user's collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub user: String,
    /// Source of the last sync, `None` when nothing was synced
    pub source: Option<String>,
    pub last_sync: Option<DateTime<Utc>>,
    pub rows: usize,
    pub unique_cards: usize,
    pub total_cards: u64,
    pub foil_cards: u64,
}

/// Up to three known names closest to `query` (Jaro-Winkler)
pub fn suggest_names<'a, I>(query: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = normalize(query);
    let mut scored: Vec<(f64, &str)> = candidates
        .into_iter()
        .map(|name| {
            let score = jaro_winkler::normalized_similarity(query.chars(), normalize(name).chars());
            (score, name)
        })
        .filter(|(score, _)| *score >= MIN_SUGGESTION_SIMILARITY)
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .map(|(_, name)| name.to_string())
        .take(MAX_SUGGESTIONS)
        .collect()
}

impl ScoutEngine {
    pub fn new(store: Arc<dyn ScoutStore>, scoring: ScoringConfig) -> Self {
        Self {
            store,
            scorer: BuildabilityScorer::new(scoring),
            ranker: RecommendationRanker::new(),
            collection_sources: Vec::new(),
            deck_sources: Vec::new(),
        }
    }

    /// Engine over a SQLite store at `db_path`
    pub async fn open(db_path: impl AsRef<str>, scoring: ScoringConfig) -> Result<Self> {
        scoring.validate()?;
        let store = Arc::new(SqliteStore::new(db_path.as_ref()).await?);
        Ok(Self::new(store, scoring))
    }

    pub fn with_collection_source(mut self, source: Arc<dyn CollectionSource>) -> Self {
        self.collection_sources.push(source);
        self
    }

    pub fn with_deck_source(mut self, source: Arc<dyn DeckStatsSource>) -> Self {
        self.deck_sources.push(source);
        self
    }

    pub fn store(&self) -> &Arc<dyn ScoutStore> {
        &self.store
    }

    pub fn scorer(&self) -> &BuildabilityScorer {
        &self.scorer
    }

    /// Fetch `user`'s collection from a registered source (by name, or the
    /// first one) and replace what is stored
    pub async fn sync_collection(&self, user: &str, source_name: Option<&str>) -> Result<SyncReport> {
        let source = match source_name {
            Some(name) => self
                .collection_sources
                .iter()
                .find(|s| s.name().eq_ignore_ascii_case(name))
                .ok_or_else(|| ScoutError::NotFound(format!("collection source '{}'", name)))?,
            None => self
                .collection_sources
                .first()
                .ok_or_else(|| ScoutError::InvalidInput("no collection source configured".to_string()))?,
        };

        self.sync_from(source.as_ref(), user).await
    }

    /// Import a Moxfield CSV export as `user`'s collection
    pub async fn import_csv(&self, user: &str, path: impl AsRef<Path>) -> Result<SyncReport> {
        let importer = MoxfieldCsvImporter::new(path.as_ref());
        self.sync_from(&importer, user).await
    }

    async fn sync_from(&self, source: &dyn CollectionSource, user: &str) -> Result<SyncReport> {
        let user = user.trim();
        if user.is_empty() {
            return Err(ScoutError::InvalidInput("user cannot be empty".to_string()));
        }

        let start = Instant::now();
        let cards = source.fetch_collection(user).await?;
        let rows = self.store.replace_collection(user, source.name(), &cards).await?;
        let index = CollectionIndex::build(&cards);

        let report = SyncReport {
            user: user.to_string(),
            source: source.name().to_string(),
            rows,
            unique_cards: index.len(),
            total_quantity: index.total_quantity(),
        };
        tracing::info!(
            "Synced {} from {}: {} rows, {} unique, {} copies ({:.0}ms)",
            report.user,
            report.source,
            report.rows,
            report.unique_cards,
            report.total_quantity,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(report)
    }

    /// Fetch a deck table from the first deck source that has it and store it,
    /// along with the commander's profile when the source provides one
    pub async fn refresh_deck(&self, commander: &str, archetype: Option<&str>) -> Result<DeckCompositionTable> {
        if commander.trim().is_empty() {
            return Err(ScoutError::InvalidInput("commander cannot be empty".to_string()));
        }

        let mut last_error = None;
        for source in &self.deck_sources {
            let table = match source.fetch_deck(commander, archetype).await {
                Ok(table) => table,
                Err(e) => {
                    tracing::warn!("Deck source {} failed for {}: {}", source.name(), commander, e);
                    last_error = Some(e);
                    continue;
                }
            };

            self.store.save_deck_table(&table).await?;

            match source.commander_profile(commander).await {
                Ok(Some(profile)) => {
                    if let Err(e) = self.store.save_commander(&profile).await {
                        tracing::warn!("Failed to save profile for {}: {}", profile.name, e);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("No profile for {} from {}: {}", commander, source.name(), e),
            }

            tracing::info!(
                "Refreshed {} from {} ({} cards)",
                table.key(),
                source.name(),
                table.total_cards()
            );
            return Ok(table);
        }

        Err(last_error
            .unwrap_or_else(|| ScoutError::InvalidInput("no deck statistics source configured".to_string())))
    }

    /// List the `limit` most popular commanders from the first deck source
    /// that can rank them, then store each profile and its default deck
    pub async fn refresh_top_commanders(&self, limit: usize) -> Result<BatchRefreshReport> {
        if limit == 0 {
            return Err(ScoutError::InvalidInput("limit must be at least 1".to_string()));
        }

        let start = Instant::now();
        let mut last_error = None;
        for source in &self.deck_sources {
            let profiles = match source.list_commanders(limit).await {
                Ok(profiles) => profiles,
                Err(e) => {
                    tracing::warn!("Deck source {} cannot list commanders: {}", source.name(), e);
                    last_error = Some(e);
                    continue;
                }
            };

            let mut report = BatchRefreshReport {
                source: source.name().to_string(),
                listed: profiles.len(),
                refreshed: 0,
                failed: Vec::new(),
            };
            for profile in &profiles {
                self.store.save_commander(profile).await?;

                let stored = match source.fetch_deck(&profile.name, None).await {
                    Ok(table) => self.store.save_deck_table(&table).await,
                    Err(e) => Err(e),
                };
                match stored {
                    Ok(()) => report.refreshed += 1,
                    Err(e) => {
                        tracing::warn!("Skipping {} from {}: {}", profile.name, source.name(), e);
                        report.failed.push(profile.name.clone());
                    }
                }
            }

            tracing::info!(
                "Refreshed {}/{} commanders from {} ({:.0}ms)",
                report.refreshed,
                report.listed,
                report.source,
                start.elapsed().as_secs_f64() * 1000.0
            );
            return Ok(report);
        }

        Err(last_error
            .unwrap_or_else(|| ScoutError::InvalidInput("no deck statistics source configured".to_string())))
    }

    /// Copy a whole static dataset into the store
    pub async fn load_dataset(&self, dataset: &StaticDeckSource) -> Result<DatasetReport> {
        for profile in dataset.commanders() {
            self.store.save_commander(profile).await?;
        }
        for table in dataset.tables() {
            self.store.save_deck_table(table).await?;
        }

        let report = DatasetReport {
            commanders: dataset.commanders().len(),
            decks: dataset.tables().len(),
        };
        tracing::info!("Loaded {} commanders and {} decks", report.commanders, report.decks);
        Ok(report)
    }

    async fn load_index(&self, user: &str) -> Result<CollectionIndex> {
        let cards = self.store.load_collection(user).await?;
        if cards.is_empty() {
            tracing::warn!("No collection stored for {}", user);
        }
        Ok(CollectionIndex::build(&cards))
    }

    /// Totals for `user`'s stored collection
    pub async fn collection_summary(&self, user: &str) -> Result<CollectionSummary> {
        let user = user.trim();
        if user.is_empty() {
            return Err(ScoutError::InvalidInput("user cannot be empty".to_string()));
        }

        let record = self.store.find_user(user).await?;
        let cards = self.store.load_collection(user).await?;
        let index = CollectionIndex::build(&cards);

        Ok(CollectionSummary {
            user: user.to_string(),
            source: record.as_ref().map(|r| r.source.clone()),
            last_sync: record.and_then(|r| r.last_sync),
            rows: cards.len(),
            unique_cards: index.len(),
            total_cards: index.total_quantity(),
            foil_cards: cards.iter().map(|c| u64::from(c.foil_quantity)).sum(),
        })
    }

    /// Score one stored deck against `user`'s collection
    pub async fn analyze_deck(&self, user: &str, commander: &str, archetype: Option<&str>) -> Result<ScoredDeck> {
        let archetype = archetype.unwrap_or(DEFAULT_ARCHETYPE);

        let table = match self.store.load_deck_table(commander, archetype).await? {
            Some(table) => table,
            None => return Err(self.deck_not_found(commander, archetype).await?),
        };

        let index = self.load_index(user).await?;
        self.scorer.score(&index, &table)
    }

    async fn deck_not_found(&self, commander: &str, archetype: &str) -> Result<ScoutError> {
        let keys = self.store.list_deck_keys().await?;

        let wanted = normalize(commander);
        let archetypes: Vec<&str> = keys
            .iter()
            .filter(|k| normalize(&k.commander) == wanted)
            .map(|k| k.archetype.as_str())
            .collect();
        if !archetypes.is_empty() {
            return Ok(ScoutError::NotFound(format!(
                "No '{}' deck for {} (available: {})",
                archetype,
                commander,
                archetypes.join(", ")
            )));
        }

        let names: BTreeSet<&str> = keys.iter().map(|k| k.commander.as_str()).collect();
        let suggestions = suggest_names(commander, names);
        Ok(if suggestions.is_empty() {
            ScoutError::NotFound(format!("No deck data for commander '{}'", commander))
        } else {
            ScoutError::NotFound(format!(
                "No deck data for commander '{}'. Did you mean: {}?",
                commander,
                suggestions.join(", ")
            ))
        })
    }

    /// Score every stored deck against `user`'s collection and rank the results
    pub async fn recommend(&self, user: &str, options: &RankingOptions) -> Result<Vec<RankedDeck>> {
        options.validate()?;
        let start = Instant::now();

        let index = self.load_index(user).await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let tables = self.store.load_deck_tables().await?;
        let profiles: HashMap<String, CommanderProfile> = self
            .store
            .load_commanders()
            .await?
            .into_iter()
            .map(|p| (normalize(&p.name), p))
            .collect();

        let scored = self.scorer.score_batch(&index, &tables);
        let mut candidates = Vec::with_capacity(scored.len());
        for (table, result) in tables.iter().zip(scored) {
            match result {
                Ok(deck) => {
                    let ranked = match profiles.get(&normalize(table.commander())) {
                        Some(profile) => RankedDeck::new(deck).with_profile(profile.clone()),
                        None => RankedDeck::new(deck),
                    };
                    candidates.push(ranked);
                }
                Err(e) => tracing::warn!("Skipping {}: {}", table.key(), e),
            }
        }

        let scored_count = candidates.len();
        let ranked = self.ranker.rank(candidates, options)?;
        tracing::info!(
            "Scored {} decks for {}, {} recommended by {} ({:.0}ms)",
            scored_count,
            user,
            ranked.len(),
            options.sort_by,
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OwnedCard;
    use crate::ranking::SortKey;
    use async_trait::async_trait;

    struct FixedCollection(Vec<OwnedCard>);

    #[async_trait]
    impl CollectionSource for FixedCollection {
        async fn fetch_collection(&self, _user: &str) -> Result<Vec<OwnedCard>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingDecks;

    #[async_trait]
    impl DeckStatsSource for FailingDecks {
        async fn fetch_deck(&self, commander: &str, _archetype: Option<&str>) -> Result<DeckCompositionTable> {
            Err(ScoutError::provider("failing", format!("down for {}", commander)))
        }

        async fn list_commanders(&self, _limit: usize) -> Result<Vec<CommanderProfile>> {
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn dataset() -> StaticDeckSource {
        StaticDeckSource::from_json_str(
            r#"{
                "commanders": [
                    {"name": "Krenko, Mob Boss", "total_decks": 20000, "popularity_rank": 3, "avg_deck_price": 250.0, "power_level": 6.0},
                    {"name": "Meren of Clan Nel Toth", "total_decks": 15000, "popularity_rank": 9, "avg_deck_price": 400.0, "power_level": 7.0}
                ],
                "decks": [
                    {"commander": "Krenko, Mob Boss", "cards": [
                        {"card_name": "Sol Ring", "inclusion_rate": 0.95, "category": "staple"},
                        {"card_name": "Goblin Chieftain", "inclusion_rate": 0.8, "synergy_score": 0.6, "category": "signature", "price_usd": 3.0}
                    ]},
                    {"commander": "Meren of Clan Nel Toth", "cards": [
                        {"card_name": "Sol Ring", "inclusion_rate": 0.9, "category": "staple"},
                        {"card_name": "Sakura-Tribe Elder", "inclusion_rate": 0.6, "category": "staple"},
                        {"card_name": "Spore Frog", "inclusion_rate": 0.5, "category": "high_synergy"}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    async fn engine() -> ScoutEngine {
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default()).await.unwrap();
        engine.load_dataset(&dataset()).await.unwrap();
        engine
    }

    #[test]
    fn test_suggest_names() {
        let names = ["Krenko, Mob Boss", "Krenko, Tin Street Kingpin", "Meren of Clan Nel Toth", "Atraxa"];
        let suggestions = suggest_names("krenko mob boss", names);
        assert_eq!(suggestions[0], "Krenko, Mob Boss");
        assert!(suggestions.len() <= 3);
        assert!(suggest_names("zzzzzz", names).is_empty());
    }

    #[tokio::test]
    async fn test_sync_collection_report() {
        let engine = engine().await.with_collection_source(Arc::new(FixedCollection(vec![
            OwnedCard::new("Sol Ring", 1, 0),
            OwnedCard::new("sol ring", 0, 1),
            OwnedCard::new("Spore Frog", 2, 0),
        ])));

        let report = engine.sync_collection("alice", None).await.unwrap();
        assert_eq!(report.rows, 3);
        assert_eq!(report.unique_cards, 2);
        assert_eq!(report.total_quantity, 4);
        assert_eq!(report.source, "fixed");

        let err = engine.sync_collection("alice", Some("moxfield")).await.unwrap_err();
        assert!(matches!(err, ScoutError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sync_without_sources() {
        let engine = engine().await;
        let err = engine.sync_collection("alice", None).await.unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_analyze_deck() {
        let engine = engine().await.with_collection_source(Arc::new(FixedCollection(vec![
            OwnedCard::new("Sol Ring", 1, 0),
        ])));
        engine.sync_collection("alice", None).await.unwrap();

        let scored = engine.analyze_deck("alice", "krenko, mob boss", None).await.unwrap();
        assert_eq!(scored.owned_cards, 1);
        assert_eq!(scored.total_cards, 2);
        assert_eq!(scored.missing_cards[0].card_name(), "Goblin Chieftain");
        assert_eq!(scored.missing_cards_value, 3.0);
    }

    #[tokio::test]
    async fn test_analyze_unknown_commander_suggests() {
        let engine = engine().await;
        match engine.analyze_deck("alice", "Krenko Mob Bos", None).await.unwrap_err() {
            ScoutError::NotFound(msg) => assert!(msg.contains("Krenko, Mob Boss"), "{}", msg),
            other => panic!("unexpected error: {}", other),
        }
        match engine.analyze_deck("alice", "Krenko, Mob Boss", Some("tokens")).await.unwrap_err() {
            ScoutError::NotFound(msg) => assert!(msg.contains("available: default"), "{}", msg),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_recommend_ranks_and_attaches_profiles() {
        let engine = engine().await.with_collection_source(Arc::new(FixedCollection(vec![
            OwnedCard::new("Sol Ring", 1, 0),
            OwnedCard::new("Sakura-Tribe Elder", 1, 0),
        ])));
        engine.sync_collection("alice", None).await.unwrap();

        let options = RankingOptions {
            sort_by: SortKey::Completion,
            min_completion: 0.0,
            limit: 10,
            budget_max: None,
            colors: None,
        };
        let ranked = engine.recommend("alice", &options).await.unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].deck.commander_name, "Meren of Clan Nel Toth");
        assert_eq!(ranked[0].attributes.power_level, 7.0);

        let by_budget = engine
            .recommend("alice", &RankingOptions { sort_by: SortKey::Budget, ..options.clone() })
            .await
            .unwrap();
        assert_eq!(by_budget[0].deck.commander_name, "Krenko, Mob Boss");
    }

    #[tokio::test]
    async fn test_recommend_empty_collection() {
        let engine = engine().await;
        let ranked = engine.recommend("nobody", &RankingOptions::default()).await.unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_deck_falls_through_sources() {
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default())
            .await
            .unwrap()
            .with_deck_source(Arc::new(FailingDecks))
            .with_deck_source(Arc::new(dataset()));

        let table = engine.refresh_deck("Krenko, Mob Boss", None).await.unwrap();
        assert_eq!(table.total_cards(), 2);
        assert!(engine.store().find_commander("krenko, mob boss").await.unwrap().is_some());

        let stored = engine
            .store()
            .load_deck_table("Krenko, Mob Boss", DEFAULT_ARCHETYPE)
            .await
            .unwrap();
        assert_eq!(stored, Some(table));
    }

    #[tokio::test]
    async fn test_refresh_deck_reports_last_error() {
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default())
            .await
            .unwrap()
            .with_deck_source(Arc::new(FailingDecks));
        let err = engine.refresh_deck("Krenko, Mob Boss", None).await.unwrap_err();
        assert!(matches!(err, ScoutError::Provider { .. }));

        let none = ScoutEngine::open(":memory:", ScoringConfig::default()).await.unwrap();
        assert!(none.refresh_deck("Krenko, Mob Boss", None).await.is_err());
    }

    #[tokio::test]
    async fn test_recommend_applies_min_completion() {
        let engine = engine().await;
        engine
            .store()
            .replace_collection("bob", "test", &[OwnedCard::new("Spore Frog", 1, 0)])
            .await
            .unwrap();

        let all = engine
            .recommend("bob", &RankingOptions { min_completion: 0.0, ..RankingOptions::default() })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let filtered = engine
            .recommend("bob", &RankingOptions { min_completion: 0.3, ..RankingOptions::default() })
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].deck.commander_name, "Meren of Clan Nel Toth");
    }

    #[tokio::test]
    async fn test_recommend_filters_by_colors() {
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default()).await.unwrap();
        let dataset = StaticDeckSource::from_json_str(
            r#"{
                "commanders": [
                    {"name": "Krenko, Mob Boss", "color_identity": ["R"]},
                    {"name": "Meren of Clan Nel Toth", "color_identity": ["B", "G"]}
                ],
                "decks": [
                    {"commander": "Krenko, Mob Boss", "cards": [{"card_name": "Sol Ring", "inclusion_rate": 0.9}]},
                    {"commander": "Meren of Clan Nel Toth", "cards": [{"card_name": "Sol Ring", "inclusion_rate": 0.9}]},
                    {"commander": "Unprofiled", "cards": [{"card_name": "Sol Ring", "inclusion_rate": 0.9}]}
                ]
            }"#,
        )
        .unwrap();
        engine.load_dataset(&dataset).await.unwrap();
        engine
            .store()
            .replace_collection("alice", "test", &[OwnedCard::new("Sol Ring", 1, 0)])
            .await
            .unwrap();

        let all = engine.recommend("alice", &RankingOptions::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let golgari = RankingOptions {
            colors: Some(vec!["GB".to_string()]),
            ..RankingOptions::default()
        };
        let ranked = engine.recommend("alice", &golgari).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].deck.commander_name, "Meren of Clan Nel Toth");

        let bad = RankingOptions {
            colors: Some(vec!["purple".to_string()]),
            ..RankingOptions::default()
        };
        let err = engine.recommend("alice", &bad).await.unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_collection_summary() {
        let engine = engine().await.with_collection_source(Arc::new(FixedCollection(vec![
            OwnedCard::new("Sol Ring", 1, 1),
            OwnedCard::new("sol ring", 2, 0),
            OwnedCard::new("Spore Frog", 0, 2),
        ])));

        let before = engine.collection_summary("alice").await.unwrap();
        assert_eq!(before.source, None);
        assert_eq!(before.rows, 0);
        assert_eq!(before.total_cards, 0);

        engine.sync_collection("alice", None).await.unwrap();
        let summary = engine.collection_summary(" alice ").await.unwrap();
        assert_eq!(summary.user, "alice");
        assert_eq!(summary.source.as_deref(), Some("fixed"));
        assert!(summary.last_sync.is_some());
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.unique_cards, 2);
        assert_eq!(summary.total_cards, 6);
        assert_eq!(summary.foil_cards, 3);

        let err = engine.collection_summary("  ").await.unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_refresh_top_commanders() {
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default())
            .await
            .unwrap()
            .with_deck_source(Arc::new(dataset()));

        let report = engine.refresh_top_commanders(1).await.unwrap();
        assert_eq!(report.source, "static");
        assert_eq!(report.listed, 1);
        assert_eq!(report.refreshed, 1);
        assert!(report.failed.is_empty());

        let stats = engine.store().stats().await.unwrap();
        assert_eq!(stats.commanders, 1);
        assert_eq!(stats.deck_tables, 1);
        assert!(engine.store().find_commander("Krenko, Mob Boss").await.unwrap().is_some());

        let err = engine.refresh_top_commanders(0).await.unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_refresh_top_commanders_records_failed_decks() {
        let listing_only = StaticDeckSource::from_json_str(
            r#"{"commanders": [{"name": "Krenko, Mob Boss", "popularity_rank": 1}], "decks": []}"#,
        )
        .unwrap();
        let engine = ScoutEngine::open(":memory:", ScoringConfig::default())
            .await
            .unwrap()
            .with_deck_source(Arc::new(listing_only));

        let report = engine.refresh_top_commanders(5).await.unwrap();
        assert_eq!(report.listed, 1);
        assert_eq!(report.refreshed, 0);
        assert_eq!(report.failed, vec!["Krenko, Mob Boss".to_string()]);
        assert!(engine.store().find_commander("Krenko, Mob Boss").await.unwrap().is_some());

        let none = ScoutEngine::open(":memory:", ScoringConfig::default()).await.unwrap();
        assert!(matches!(
            none.refresh_top_commanders(5).await.unwrap_err(),
            ScoutError::InvalidInput(_)
        ));
    }
}
