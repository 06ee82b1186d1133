use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::collection::normalize;
use crate::core::{CommanderProfile, DeckCard};
use crate::deck::{DeckCompositionTable, DeckKey, DEFAULT_ARCHETYPE};
use crate::error::{Result, ScoutError};
use crate::providers::DeckStatsSource;

/// On-disk dataset layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeckDataset {
    #[serde(default)]
    pub commanders: Vec<CommanderProfile>,
    #[serde(default)]
    pub decks: Vec<DatasetDeck>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetDeck {
    pub commander: String,
    #[serde(default)]
    pub archetype: Option<String>,
    #[serde(default)]
    pub budget_range: Option<String>,
    pub cards: Vec<DeckCard>,
}

impl DatasetDeck {
    fn into_table(self) -> Result<DeckCompositionTable> {
        let mut key = DeckKey::new(self.commander);
        if let Some(archetype) = self.archetype {
            key = key.with_archetype(archetype);
        }
        if let Some(budget) = self.budget_range {
            key = key.with_budget_range(budget);
        }
        DeckCompositionTable::new(key, self.cards)
    }
}

/// Deck statistics served from a JSON file loaded up front
#[derive(Debug, Clone, Default)]
pub struct StaticDeckSource {
    commanders: Vec<CommanderProfile>,
    tables: Vec<DeckCompositionTable>,
}

impl StaticDeckSource {
    /// Validate every commander and deck in the dataset
    pub fn from_dataset(dataset: DeckDataset) -> Result<Self> {
        for commander in &dataset.commanders {
            commander.validate()?;
        }
        let tables = dataset
            .decks
            .into_iter()
            .map(DatasetDeck::into_table)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            commanders: dataset.commanders,
            tables,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_dataset(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let source = Self::from_json_str(&json)?;
        info!(
            "Loaded dataset {}: {} commanders, {} decks",
            path.display(),
            source.commanders.len(),
            source.tables.len()
        );
        Ok(source)
    }

    pub fn commanders(&self) -> &[CommanderProfile] {
        &self.commanders
    }

    pub fn tables(&self) -> &[DeckCompositionTable] {
        &self.tables
    }

    fn find_table(&self, commander: &str, archetype: Option<&str>) -> Option<&DeckCompositionTable> {
        let commander = normalize(commander);
        let mut for_commander = self
            .tables
            .iter()
            .filter(|t| normalize(t.commander()) == commander);

        match archetype {
            Some(archetype) => {
                let archetype = normalize(archetype);
                for_commander.find(|t| normalize(t.archetype()) == archetype)
            }
            None => {
                let candidates: Vec<&DeckCompositionTable> = for_commander.collect();
                candidates
                    .iter()
                    .find(|t| t.archetype() == DEFAULT_ARCHETYPE)
                    .or_else(|| candidates.first())
                    .copied()
            }
        }
    }
}

#[async_trait]
impl DeckStatsSource for StaticDeckSource {
    async fn fetch_deck(&self, commander: &str, archetype: Option<&str>) -> Result<DeckCompositionTable> {
        self.find_table(commander, archetype).cloned().ok_or_else(|| {
            ScoutError::NotFound(format!(
                "No deck data for {} ({})",
                commander,
                archetype.unwrap_or(DEFAULT_ARCHETYPE)
            ))
        })
    }

    async fn commander_profile(&self, commander: &str) -> Result<Option<CommanderProfile>> {
        let wanted = normalize(commander);
        Ok(self
            .commanders
            .iter()
            .find(|c| normalize(&c.name) == wanted)
            .cloned())
    }

    async fn list_commanders(&self, limit: usize) -> Result<Vec<CommanderProfile>> {
        let mut commanders = self.commanders.clone();
        commanders.sort_by(|a, b| {
            a.popularity_rank
                .cmp(&b.popularity_rank)
                .then_with(|| b.total_decks.cmp(&a.total_decks))
                .then_with(|| a.name.cmp(&b.name))
        });
        commanders.truncate(limit);
        Ok(commanders)
    }

    fn name(&self) -> &str {
        "static"
    }
}
