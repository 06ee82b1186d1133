use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ScoutError};

/// Role of a card in decks built around a commander
///
/// Unrecognized labels from a statistics source are kept verbatim in `Other`
/// so they survive a store round-trip; they weigh like `Basic` when scored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CardCategory {
    /// Commander-defining cards
    Signature,
    HighSynergy,
    #[default]
    Staple,
    Basic,
    Other(String),
}

impl CardCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "signature" => CardCategory::Signature,
            "high_synergy" => CardCategory::HighSynergy,
            "staple" => CardCategory::Staple,
            "basic" => CardCategory::Basic,
            _ => CardCategory::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CardCategory::Signature => "signature",
            CardCategory::HighSynergy => "high_synergy",
            CardCategory::Staple => "staple",
            CardCategory::Basic => "basic",
            CardCategory::Other(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, CardCategory::Other(_))
    }
}

impl From<String> for CardCategory {
    fn from(raw: String) -> Self {
        CardCategory::parse(&raw)
    }
}

impl From<CardCategory> for String {
    fn from(category: CardCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One card of a commander's deck composition with its usage statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeckCard {
    pub card_name: String,

    /// Fraction of sampled decks running the card (0.0 - 1.0)
    pub inclusion_rate: f64,

    /// Signed synergy with the commander, never clamped
    #[serde(default)]
    pub synergy_score: f64,

    #[serde(default)]
    pub category: CardCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
}

impl DeckCard {
    pub fn new(
        card_name: impl Into<String>,
        inclusion_rate: f64,
        synergy_score: f64,
        category: CardCategory,
    ) -> Self {
        Self {
            card_name: card_name.into(),
            inclusion_rate,
            synergy_score,
            category,
            price_usd: None,
        }
    }

    pub fn with_price(mut self, price_usd: f64) -> Self {
        self.price_usd = Some(price_usd);
        self
    }

    /// Check the invariants an upstream collaborator must honour.
    /// `context` names the deck the card came from for error messages.
    pub fn validate(&self, context: &str) -> Result<()> {
        let where_ = format!("{} card '{}'", context, self.card_name);

        if self.card_name.trim().is_empty() {
            return Err(ScoutError::contract("card_name", "\"\"", context));
        }
        if !(0.0..=1.0).contains(&self.inclusion_rate) {
            return Err(ScoutError::contract("inclusion_rate", self.inclusion_rate, where_));
        }
        if !self.synergy_score.is_finite() {
            return Err(ScoutError::contract("synergy_score", self.synergy_score, where_));
        }

        Ok(())
    }

    /// Price usable as a cost estimate: present, finite and non-negative
    pub fn usable_price(&self) -> Option<f64> {
        self.price_usd.filter(|p| p.is_finite() && *p >= 0.0)
    }
}
