use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoutError};

/// One (user, card name) row of a collection with its owned copies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnedCard {
    /// Card name as reported by the source (case-insensitive identity)
    pub card_name: String,

    /// Non-foil copies
    #[serde(default)]
    pub quantity: u32,

    /// Foil (and etched) copies
    #[serde(default)]
    pub foil_quantity: u32,
}

impl OwnedCard {
    pub fn new(card_name: impl Into<String>, quantity: u32, foil_quantity: u32) -> Self {
        Self {
            card_name: card_name.into(),
            quantity,
            foil_quantity,
        }
    }

    /// Build from raw collaborator values, rejecting negative quantities
    pub fn try_new(card_name: impl Into<String>, quantity: i64, foil_quantity: i64) -> Result<Self> {
        let card_name = card_name.into();
        if card_name.trim().is_empty() {
            return Err(ScoutError::InvalidInput("card name cannot be empty".to_string()));
        }

        let context = format!("collection row '{}'", card_name);
        let quantity = u32::try_from(quantity)
            .map_err(|_| ScoutError::contract("quantity", quantity, context.clone()))?;
        let foil_quantity = u32::try_from(foil_quantity)
            .map_err(|_| ScoutError::contract("foil_quantity", foil_quantity, context))?;

        Ok(Self::new(card_name, quantity, foil_quantity))
    }

    /// Regular plus foil copies
    pub fn total_quantity(&self) -> u32 {
        self.quantity.saturating_add(self.foil_quantity)
    }

    pub fn is_owned(&self) -> bool {
        self.total_quantity() > 0
    }
}
