use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::{CommanderProfile, ScoredDeck};
use crate::error::{Result, ScoutError};

/// Field used to order recommendations (always descending)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Completion,
    #[default]
    Buildability,
    Popularity,
    PowerLevel,
    Budget,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Completion => "completion",
            SortKey::Buildability => "buildability",
            SortKey::Popularity => "popularity",
            SortKey::PowerLevel => "power_level",
            SortKey::Budget => "budget",
        }
    }
}

impl FromStr for SortKey {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "completion" => Ok(SortKey::Completion),
            "buildability" => Ok(SortKey::Buildability),
            "popularity" => Ok(SortKey::Popularity),
            "power_level" | "power" => Ok(SortKey::PowerLevel),
            "budget" => Ok(SortKey::Budget),
            other => Err(ScoutError::InvalidInput(format!(
                "unknown sort key '{}' (expected completion, buildability, popularity, power_level or budget)",
                other
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied sort keys that the scorer does not compute.
/// Higher is better for every field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingAttributes {
    pub popularity: f64,
    pub power_level: f64,
    pub budget: f64,
}

impl Default for RankingAttributes {
    fn default() -> Self {
        Self {
            popularity: 0.0,
            power_level: 5.0,
            budget: 0.0,
        }
    }
}

impl From<&CommanderProfile> for RankingAttributes {
    /// Budget is the negated average deck price so cheaper decks sort first
    fn from(profile: &CommanderProfile) -> Self {
        Self {
            popularity: profile.total_decks as f64,
            power_level: profile.power_level,
            budget: -profile.avg_deck_price,
        }
    }
}

/// A scored deck plus the commander attributes it is ranked by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDeck {
    pub deck: ScoredDeck,
    pub attributes: RankingAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<CommanderProfile>,
}

impl RankedDeck {
    pub fn new(deck: ScoredDeck) -> Self {
        Self {
            deck,
            attributes: RankingAttributes::default(),
            profile: None,
        }
    }

    /// Attach commander metadata and derive the ranking attributes from it
    pub fn with_profile(mut self, profile: CommanderProfile) -> Self {
        self.attributes = RankingAttributes::from(&profile);
        self.profile = Some(profile);
        self
    }

    pub fn sort_value(&self, key: SortKey) -> f64 {
        match key {
            SortKey::Completion => self.deck.completion_percentage,
            SortKey::Buildability => self.deck.buildability_score,
            SortKey::Popularity => self.attributes.popularity,
            SortKey::PowerLevel => self.attributes.power_level,
            SortKey::Budget => self.attributes.budget,
        }
    }
}

/// Filter/sort/limit options for a recommendation batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingOptions {
    pub sort_by: SortKey,
    pub min_completion: f64,
    pub limit: usize,
    /// Drop decks whose missing cards cost more than this
    pub budget_max: Option<f64>,
    /// Keep only commanders with exactly this color identity
    /// (letters from W, U, B, R, G, or C for colorless)
    pub colors: Option<Vec<String>>,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            sort_by: SortKey::default(),
            min_completion: 0.6,
            limit: 20,
            budget_max: None,
            colors: None,
        }
    }
}

const COLOR_LETTERS: [char; 6] = ['W', 'U', 'B', 'R', 'G', 'C'];

impl RankingOptions {
    /// Requested identity as sorted letters, comparable with
    /// `CommanderProfile::color_identity_str`
    pub fn color_filter(&self) -> Option<String> {
        let colors = self.colors.as_ref()?;
        let mut letters: Vec<String> = colors
            .iter()
            .flat_map(|c| c.chars())
            .filter(|c| !c.is_whitespace() && *c != ',')
            .map(|c| c.to_ascii_uppercase().to_string())
            .collect();
        letters.sort();
        letters.dedup();
        Some(letters.concat())
    }

    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ScoutError::InvalidInput("limit must be greater than 0".to_string()));
        }
        if self.min_completion.is_nan() {
            return Err(ScoutError::InvalidInput("min_completion must be a number".to_string()));
        }
        if let Some(budget) = self.budget_max {
            if budget.is_nan() || budget < 0.0 {
                return Err(ScoutError::InvalidInput(format!(
                    "budget_max must be non-negative, got {}",
                    budget
                )));
            }
        }
        if let Some(colors) = self.color_filter() {
            if colors.is_empty() || !colors.chars().all(|c| COLOR_LETTERS.contains(&c)) {
                return Err(ScoutError::InvalidInput(format!(
                    "colors must be letters from WUBRGC, got '{}'",
                    colors
                )));
            }
        }
        Ok(())
    }
}

/// Orders scored decks across commanders and keeps the top N
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationRanker;

impl RecommendationRanker {
    pub fn new() -> Self {
        Self
    }

    /// Filter by completion (and budget, colors), sort descending by the chosen key
    /// with commander name as tie-break, truncate to `limit`.
    /// No survivors is an empty list, not an error.
    pub fn rank(&self, results: Vec<RankedDeck>, options: &RankingOptions) -> Result<Vec<RankedDeck>> {
        options.validate()?;

        let colors = options.color_filter();
        let mut ranked: Vec<RankedDeck> = results
            .into_iter()
            .filter(|r| r.deck.completion_percentage >= options.min_completion)
            .filter(|r| match options.budget_max {
                Some(max) => r.deck.missing_cards_value <= max,
                None => true,
            })
            .filter(|r| match (&colors, &r.profile) {
                (None, _) => true,
                // Unknown identity never matches a color request
                (Some(_), None) => false,
                (Some(wanted), Some(profile)) => profile.color_identity_str().to_ascii_uppercase() == *wanted,
            })
            .collect();

        let key = options.sort_by;
        ranked.sort_by(|a, b| {
            b.sort_value(key)
                .total_cmp(&a.sort_value(key))
                .then_with(|| a.deck.commander_name.cmp(&b.deck.commander_name))
                .then_with(|| a.deck.archetype.cmp(&b.deck.archetype))
        });
        ranked.truncate(options.limit);

        Ok(ranked)
    }

    pub fn name(&self) -> &str {
        "recommendation"
    }
}
