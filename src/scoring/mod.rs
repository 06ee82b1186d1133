//! Buildability scoring: one collection against one deck composition.
//!
//! For every unowned card:
//!   impact   = inclusion_rate * category_weight * (1 + synergy_score)
//!   priority = first of critical/high/medium threshold the impact reaches, else low
//!   cost     = price_usd when present and non-negative, else 0
//!
//! completion   = owned / total (0 when the deck is empty)
//! buildability = min(max, completion * scale)

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collection::CollectionIndex;
use crate::core::{CardCategory, DeckCard, MissingCardEntry, PriorityThresholds, ScoredDeck};
use crate::deck::DeckCompositionTable;
use crate::error::{Result, ScoutError};

/// Multiplier applied to a missing card's inclusion rate per category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub signature: f64,
    pub high_synergy: f64,
    pub staple: f64,
    pub basic: f64,
    /// Used for labels the statistics source invented
    pub unrecognized: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            signature: 3.0,
            high_synergy: 2.0,
            staple: 1.5,
            basic: 1.0,
            unrecognized: 1.0,
        }
    }
}

impl CategoryWeights {
    pub fn weight_for(&self, category: &CardCategory) -> f64 {
        match category {
            CardCategory::Signature => self.signature,
            CardCategory::HighSynergy => self.high_synergy,
            CardCategory::Staple => self.staple,
            CardCategory::Basic => self.basic,
            CardCategory::Other(_) => self.unrecognized,
        }
    }
}

/// Weights and thresholds for the scorer, passed per call instead of read from globals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub category_weights: CategoryWeights,
    pub thresholds: PriorityThresholds,
    pub buildability_scale: f64,
    pub buildability_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            category_weights: CategoryWeights::default(),
            thresholds: PriorityThresholds::default(),
            buildability_scale: 10.0,
            buildability_max: 10.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let w = &self.category_weights;
        for (name, value) in [
            ("signature", w.signature),
            ("high_synergy", w.high_synergy),
            ("staple", w.staple),
            ("basic", w.basic),
            ("unrecognized", w.unrecognized),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ScoutError::Config(format!(
                    "scoring.category_weights.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        let t = &self.thresholds;
        if !(t.critical > t.high && t.high > t.medium) {
            return Err(ScoutError::Config(format!(
                "scoring.thresholds must be strictly descending (critical {} > high {} > medium {})",
                t.critical, t.high, t.medium
            )));
        }

        if !(self.buildability_scale.is_finite() && self.buildability_scale >= 0.0) {
            return Err(ScoutError::Config(format!(
                "scoring.buildability_scale must be non-negative, got {}",
                self.buildability_scale
            )));
        }
        if !(self.buildability_max.is_finite() && self.buildability_max >= 0.0) {
            return Err(ScoutError::Config(format!(
                "scoring.buildability_max must be non-negative, got {}",
                self.buildability_max
            )));
        }

        Ok(())
    }
}

/// Impact of not owning `card`
pub fn impact_score(card: &DeckCard, weights: &CategoryWeights) -> f64 {
    card.inclusion_rate * weights.weight_for(&card.category) * (1.0 + card.synergy_score)
}

/// Scores collections against deck compositions. Holds no state besides its config.
#[derive(Debug, Clone, Default)]
pub struct BuildabilityScorer {
    config: ScoringConfig,
}

impl BuildabilityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn impact_score(&self, card: &DeckCard) -> f64 {
        impact_score(card, &self.config.category_weights)
    }

    /// High impact: at least the "high" threshold, or a signature/high-synergy card
    pub fn is_high_impact(&self, card: &DeckCard) -> bool {
        self.impact_score(card) >= self.config.thresholds.high
            || matches!(card.category, CardCategory::Signature | CardCategory::HighSynergy)
    }

    /// Score one deck table against one collection
    pub fn score(&self, index: &CollectionIndex, table: &DeckCompositionTable) -> Result<ScoredDeck> {
        let context = table.key().to_string();

        let mut owned_cards = 0usize;
        let mut missing_cards = Vec::new();

        for card in table.cards() {
            card.validate(&context)?;

            if index.owns(&card.card_name) {
                owned_cards += 1;
                continue;
            }

            let impact = self.impact_score(card);
            let cost = card.usable_price().unwrap_or(0.0);
            missing_cards.push(MissingCardEntry::new(
                card.clone(),
                impact,
                cost,
                &self.config.thresholds,
            ));
        }

        let total_cards = table.total_cards();
        let completion_percentage = if total_cards == 0 {
            0.0
        } else {
            owned_cards as f64 / total_cards as f64
        };

        let buildability_score = (completion_percentage * self.config.buildability_scale)
            .min(self.config.buildability_max)
            .max(0.0);

        missing_cards.sort_by(|a, b| {
            b.priority_level()
                .rank()
                .cmp(&a.priority_level().rank())
                .then_with(|| b.impact_score().total_cmp(&a.impact_score()))
                .then_with(|| a.card_name().cmp(b.card_name()))
        });

        let missing_cards_value = missing_cards.iter().map(|m| m.estimated_cost()).sum();

        Ok(ScoredDeck {
            commander_name: table.commander().to_string(),
            archetype: table.archetype().to_string(),
            budget_range: table.key().budget_range.clone(),
            owned_cards,
            total_cards,
            completion_percentage,
            buildability_score,
            missing_cards,
            missing_cards_value,
        })
    }

    /// Score many tables in parallel. Output order matches `tables`; each
    /// table succeeds or fails on its own.
    pub fn score_batch(
        &self,
        index: &CollectionIndex,
        tables: &[DeckCompositionTable],
    ) -> Vec<Result<ScoredDeck>> {
        tables.par_iter().map(|table| self.score(index, table)).collect()
    }
}
