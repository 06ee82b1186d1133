use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{CardCategory, DeckCard};
use crate::error::Result;

pub const DEFAULT_ARCHETYPE: &str = "default";

fn default_archetype() -> String {
    DEFAULT_ARCHETYPE.to_string()
}

/// Identifies one deck composition: commander plus archetype/budget variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckKey {
    pub commander: String,
    #[serde(default = "default_archetype")]
    pub archetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
}

impl DeckKey {
    pub fn new(commander: impl Into<String>) -> Self {
        Self {
            commander: commander.into(),
            archetype: default_archetype(),
            budget_range: None,
        }
    }

    pub fn with_archetype(mut self, archetype: impl Into<String>) -> Self {
        self.archetype = archetype.into();
        self
    }

    pub fn with_budget_range(mut self, budget_range: impl Into<String>) -> Self {
        self.budget_range = Some(budget_range.into());
        self
    }
}

impl fmt::Display for DeckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.commander, self.archetype)?;
        if let Some(budget) = &self.budget_range {
            write!(f, " ({})", budget)?;
        }
        Ok(())
    }
}

/// Immutable card list for one deck key, in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckCompositionTable {
    key: DeckKey,
    cards: Vec<DeckCard>,
}

impl DeckCompositionTable {
    /// Build a table, failing on the first card that breaks a DeckCard invariant
    pub fn new(key: DeckKey, cards: Vec<DeckCard>) -> Result<Self> {
        let context = key.to_string();
        for card in &cards {
            card.validate(&context)?;
        }
        Ok(Self { key, cards })
    }

    pub fn key(&self) -> &DeckKey {
        &self.key
    }

    pub fn commander(&self) -> &str {
        &self.key.commander
    }

    pub fn archetype(&self) -> &str {
        &self.key.archetype
    }

    /// Exactly the number of entries given, no 99+1 assumption
    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[DeckCard] {
        &self.cards
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards_by_category<'a>(
        &'a self,
        category: &'a CardCategory,
    ) -> impl Iterator<Item = &'a DeckCard> + 'a {
        self.cards.iter().filter(move |c| &c.category == category)
    }

    pub fn signature_cards(&self) -> Vec<&DeckCard> {
        self.cards_by_category(&CardCategory::Signature).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(name: &str, rate: f64, category: CardCategory) -> DeckCard {
        DeckCard::new(name, rate, 0.0, category)
    }

    #[test]
    fn test_total_cards_reports_what_it_was_given() {
        let table = DeckCompositionTable::new(
            DeckKey::new("Krenko, Mob Boss"),
            vec![
                card("Goblin Chieftain", 0.7, CardCategory::HighSynergy),
                card("Sol Ring", 0.9, CardCategory::Staple),
            ],
        )
        .unwrap();
        assert_eq!(table.total_cards(), 2);
        assert_eq!(table.archetype(), DEFAULT_ARCHETYPE);

        let empty = DeckCompositionTable::new(DeckKey::new("Krenko, Mob Boss"), vec![]).unwrap();
        assert_eq!(empty.total_cards(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_insertion_order_is_stable() {
        let names = ["Zulaport Cutthroat", "Ashnod's Altar", "Mayhem Devil"];
        let cards = names
            .iter()
            .map(|n| card(n, 0.5, CardCategory::Staple))
            .collect();
        let table = DeckCompositionTable::new(DeckKey::new("Prossh"), cards).unwrap();
        let got: Vec<&str> = table.cards().iter().map(|c| c.card_name.as_str()).collect();
        assert_eq!(got, names);
    }

    #[test]
    fn test_rejects_out_of_range_inclusion() {
        let err = DeckCompositionTable::new(
            DeckKey::new("Krenko, Mob Boss").with_archetype("tokens"),
            vec![card("Sol Ring", -0.1, CardCategory::Staple)],
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Krenko, Mob Boss/tokens"));
        assert!(msg.contains("inclusion_rate"));
    }

    #[test]
    fn test_signature_cards() {
        let table = DeckCompositionTable::new(
            DeckKey::new("Krenko, Mob Boss"),
            vec![
                card("Goblin Warchief", 0.6, CardCategory::Signature),
                card("Sol Ring", 0.9, CardCategory::Staple),
            ],
        )
        .unwrap();
        let sig = table.signature_cards();
        assert_eq!(sig.len(), 1);
        assert_eq!(sig[0].card_name, "Goblin Warchief");
    }

    #[test]
    fn test_key_display() {
        let key = DeckKey::new("Atraxa").with_archetype("superfriends").with_budget_range("mid");
        assert_eq!(key.to_string(), "Atraxa/superfriends (mid)");
    }
}
