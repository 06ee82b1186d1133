use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

fn default_popularity_rank() -> u32 {
    500
}

fn default_power_level() -> f64 {
    5.0
}

/// Commander metadata carried alongside scored decks for ranking and display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommanderProfile {
    pub name: String,

    /// Color identity letters (W, U, B, R, G)
    #[serde(default)]
    pub color_identity: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archetype: Option<String>,

    /// budget / mid / high / cedh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<String>,

    #[serde(default)]
    pub themes: Vec<String>,

    /// Number of sampled decks for this commander
    #[serde(default)]
    pub total_decks: u64,

    /// 1 = most popular
    #[serde(default = "default_popularity_rank")]
    pub popularity_rank: u32,

    #[serde(default)]
    pub avg_deck_price: f64,

    /// 0.0 - 5.0
    #[serde(default)]
    pub salt_score: f64,

    /// 1.0 - 10.0
    #[serde(default = "default_power_level")]
    pub power_level: f64,
}

impl CommanderProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color_identity: Vec::new(),
            archetype: None,
            budget_range: None,
            themes: Vec::new(),
            total_decks: 0,
            popularity_rank: default_popularity_rank(),
            avg_deck_price: 0.0,
            salt_score: 0.0,
            power_level: default_power_level(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let context = format!("commander '{}'", self.name);
        if self.name.trim().is_empty() {
            return Err(ScoutError::InvalidInput("commander name cannot be empty".to_string()));
        }
        if self.popularity_rank < 1 {
            return Err(ScoutError::contract("popularity_rank", self.popularity_rank, context));
        }
        if !(self.avg_deck_price >= 0.0) {
            return Err(ScoutError::contract("avg_deck_price", self.avg_deck_price, context));
        }
        if !(0.0..=5.0).contains(&self.salt_score) {
            return Err(ScoutError::contract("salt_score", self.salt_score, context));
        }
        if !(1.0..=10.0).contains(&self.power_level) {
            return Err(ScoutError::contract("power_level", self.power_level, context));
        }
        Ok(())
    }

    /// Sorted color letters, "C" for colorless
    pub fn color_identity_str(&self) -> String {
        if self.color_identity.is_empty() {
            return "C".to_string();
        }
        let mut colors = self.color_identity.clone();
        colors.sort();
        colors.concat()
    }

    pub fn budget_category(&self) -> &'static str {
        if self.avg_deck_price < 150.0 {
            "budget"
        } else if self.avg_deck_price < 500.0 {
            "mid"
        } else if self.avg_deck_price < 1000.0 {
            "high"
        } else {
            "cedh"
        }
    }

    pub fn is_popular(&self) -> bool {
        self.popularity_rank <= 100
    }
}
