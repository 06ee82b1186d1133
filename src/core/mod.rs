pub mod commander;
pub mod deck_card;
pub mod owned_card;
pub mod scored_deck;

pub use commander::CommanderProfile;
pub use deck_card::{CardCategory, DeckCard};
pub use owned_card::OwnedCard;
pub use scored_deck::{Affordability, MissingCardEntry, PriorityLevel, PriorityThresholds, ScoredDeck};
