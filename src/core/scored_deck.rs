use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::DeckCard;

/// How urgently a missing card should be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    /// Higher rank sorts first
    pub fn rank(self) -> u8 {
        match self {
            PriorityLevel::Critical => 3,
            PriorityLevel::High => 2,
            PriorityLevel::Medium => 1,
            PriorityLevel::Low => 0,
        }
    }

    /// First threshold the impact reaches wins, checked from critical down
    pub fn from_impact(impact_score: f64, thresholds: &PriorityThresholds) -> Self {
        if impact_score >= thresholds.critical {
            PriorityLevel::Critical
        } else if impact_score >= thresholds.high {
            PriorityLevel::High
        } else if impact_score >= thresholds.medium {
            PriorityLevel::Medium
        } else {
            PriorityLevel::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriorityLevel::Critical => "critical",
            PriorityLevel::High => "high",
            PriorityLevel::Medium => "medium",
            PriorityLevel::Low => "low",
        }
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Impact cut-offs for each priority level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            critical: 3.0,
            high: 2.0,
            medium: 1.0,
        }
    }
}

/// A deck card the user does not own, with its acquisition priority
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingCardEntry {
    deck_card: DeckCard,
    estimated_cost: f64,
    impact_score: f64,
    priority_level: PriorityLevel,
    #[serde(default)]
    alternatives: Vec<String>,
}

impl MissingCardEntry {
    /// Priority is always derived from `impact_score`
    pub fn new(
        deck_card: DeckCard,
        impact_score: f64,
        estimated_cost: f64,
        thresholds: &PriorityThresholds,
    ) -> Self {
        Self {
            deck_card,
            estimated_cost,
            impact_score,
            priority_level: PriorityLevel::from_impact(impact_score, thresholds),
            alternatives: Vec::new(),
        }
    }

    pub fn deck_card(&self) -> &DeckCard {
        &self.deck_card
    }

    pub fn card_name(&self) -> &str {
        &self.deck_card.card_name
    }

    pub fn estimated_cost(&self) -> f64 {
        self.estimated_cost
    }

    pub fn impact_score(&self) -> f64 {
        self.impact_score
    }

    pub fn priority_level(&self) -> PriorityLevel {
        self.priority_level
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }
}

/// Affordability bucket based on what the missing cards cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affordability {
    VeryAffordable,
    Affordable,
    Moderate,
    Expensive,
    VeryExpensive,
}

impl Affordability {
    pub fn from_missing_value(value: f64) -> Self {
        if value <= 25.0 {
            Affordability::VeryAffordable
        } else if value <= 75.0 {
            Affordability::Affordable
        } else if value <= 150.0 {
            Affordability::Moderate
        } else if value <= 300.0 {
            Affordability::Expensive
        } else {
            Affordability::VeryExpensive
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Affordability::VeryAffordable => "very_affordable",
            Affordability::Affordable => "affordable",
            Affordability::Moderate => "moderate",
            Affordability::Expensive => "expensive",
            Affordability::VeryExpensive => "very_expensive",
        }
    }
}

/// Result of scoring one commander deck against one collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDeck {
    pub commander_name: String,
    pub archetype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,
    pub owned_cards: usize,
    pub total_cards: usize,
    /// Owned fraction of the deck list (0.0 - 1.0)
    pub completion_percentage: f64,
    /// 0.0 - 10.0
    pub buildability_score: f64,
    /// Sorted by priority, then impact, then name
    pub missing_cards: Vec<MissingCardEntry>,
    pub missing_cards_value: f64,
}

impl ScoredDeck {
    pub fn missing_cards_count(&self) -> usize {
        self.total_cards.saturating_sub(self.owned_cards)
    }

    /// Missing cards at high priority or above
    pub fn missing_high_impact_count(&self) -> usize {
        self.missing_cards
            .iter()
            .filter(|m| m.priority_level().rank() >= PriorityLevel::High.rank())
            .count()
    }

    pub fn is_highly_buildable(&self) -> bool {
        self.completion_percentage >= 0.8 && self.buildability_score >= 7.0
    }

    pub fn affordability(&self) -> Affordability {
        Affordability::from_missing_value(self.missing_cards_value)
    }

    /// Blend of completion, buildability and cost used for display ordering
    pub fn priority_score(&self) -> f64 {
        let completion_factor = self.completion_percentage * 40.0;
        let buildability_factor = (self.buildability_score / 10.0) * 35.0;
        let affordability_factor = ((200.0 - self.missing_cards_value) / 200.0).max(0.0) * 25.0;
        completion_factor + buildability_factor + affordability_factor
    }

    pub fn completion_display(&self) -> String {
        format!("{:.1}%", self.completion_percentage * 100.0)
    }

    pub fn buildability_display(&self) -> String {
        format!("{:.1}/10", self.buildability_score)
    }
}
