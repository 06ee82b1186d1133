//! Owned-quantity lookup keyed by normalized card name.

use std::collections::HashMap;

use crate::core::OwnedCard;

/// Normalize a card name for lookups (trim + lowercase)
pub fn normalize(card_name: &str) -> String {
    card_name.trim().to_lowercase()
}

/// A user's collection as an O(1) lookup of owned copies by card name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionIndex {
    quantities: HashMap<String, u64>,
}

impl CollectionIndex {
    /// Build from collection rows. Rows that normalize to the same name
    /// (different printings, foil and non-foil rows) are summed.
    pub fn build(owned_cards: &[OwnedCard]) -> Self {
        let mut quantities: HashMap<String, u64> = HashMap::with_capacity(owned_cards.len());
        for card in owned_cards {
            *quantities.entry(normalize(&card.card_name)).or_insert(0) +=
                u64::from(card.total_quantity());
        }
        Self { quantities }
    }

    /// Owned copies of a card, 0 when absent
    pub fn quantity_of(&self, card_name: &str) -> u64 {
        self.quantities
            .get(&normalize(card_name))
            .copied()
            .unwrap_or(0)
    }

    pub fn owns(&self, card_name: &str) -> bool {
        self.quantity_of(card_name) >= 1
    }

    /// Number of distinct card names (including zero-quantity rows)
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// All copies across the collection
    pub fn total_quantity(&self) -> u64 {
        self.quantities.values().sum()
    }
}

impl FromIterator<OwnedCard> for CollectionIndex {
    fn from_iter<I: IntoIterator<Item = OwnedCard>>(iter: I) -> Self {
        let cards: Vec<OwnedCard> = iter.into_iter().collect();
        Self::build(&cards)
    }
}
