use commander_scout::{
    BuildabilityScorer, CardCategory, CollectionIndex, DeckCard, DeckCompositionTable, DeckKey, OwnedCard,
    ScoringConfig,
};
use proptest::prelude::*;

const CARD_POOL: &[&str] = &[
    "Sol Ring",
    "Arcane Signet",
    "Command Tower",
    "Cultivate",
    "Swords to Plowshares",
    "Rhystic Study",
    "Smothering Tithe",
    "Eternal Witness",
    "Doubling Season",
    "Forest",
];

fn category_strategy() -> impl Strategy<Value = CardCategory> {
    prop_oneof![
        Just(CardCategory::Signature),
        Just(CardCategory::HighSynergy),
        Just(CardCategory::Staple),
        Just(CardCategory::Basic),
        Just(CardCategory::Other("combo".to_string())),
    ]
}

fn deck_card_strategy() -> impl Strategy<Value = DeckCard> {
    (
        0..CARD_POOL.len(),
        0.0..=1.0f64,
        -1.0..5.0f64,
        category_strategy(),
        proptest::option::of(-5.0..100.0f64),
    )
        .prop_map(|(i, inclusion, synergy, category, price)| {
            let card = DeckCard::new(CARD_POOL[i], inclusion, synergy, category);
            match price {
                Some(p) => card.with_price(p),
                None => card,
            }
        })
}

fn table_strategy() -> impl Strategy<Value = DeckCompositionTable> {
    proptest::collection::vec(deck_card_strategy(), 0..30)
        .prop_map(|cards| DeckCompositionTable::new(DeckKey::new("Test Commander"), cards).unwrap())
}

fn collection_strategy() -> impl Strategy<Value = Vec<OwnedCard>> {
    proptest::collection::vec((0..CARD_POOL.len(), 0..4u32, 0..2u32), 0..12).prop_map(|rows| {
        rows.into_iter()
            .map(|(i, qty, foil)| OwnedCard::new(CARD_POOL[i], qty, foil))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_completion_and_buildability_bounded(
        owned in collection_strategy(),
        table in table_strategy(),
    ) {
        let scorer = BuildabilityScorer::new(ScoringConfig::default());
        let deck = scorer.score(&CollectionIndex::build(&owned), &table).unwrap();

        prop_assert!((0.0..=1.0).contains(&deck.completion_percentage));
        prop_assert!((0.0..=10.0).contains(&deck.buildability_score));
        prop_assert!(deck.owned_cards <= deck.total_cards);
        prop_assert_eq!(deck.owned_cards + deck.missing_cards.len(), deck.total_cards);
        if deck.total_cards == 0 {
            prop_assert_eq!(deck.completion_percentage, 0.0);
        }
    }

    #[test]
    fn prop_priority_never_drops_as_impact_rises(
        owned in collection_strategy(),
        table in table_strategy(),
    ) {
        let scorer = BuildabilityScorer::new(ScoringConfig::default());
        let deck = scorer.score(&CollectionIndex::build(&owned), &table).unwrap();

        for a in &deck.missing_cards {
            for b in &deck.missing_cards {
                if a.impact_score() > b.impact_score() {
                    prop_assert!(a.priority_level().rank() >= b.priority_level().rank());
                }
            }
        }
    }

    #[test]
    fn prop_missing_value_is_non_negative_sum(
        owned in collection_strategy(),
        table in table_strategy(),
    ) {
        let scorer = BuildabilityScorer::new(ScoringConfig::default());
        let deck = scorer.score(&CollectionIndex::build(&owned), &table).unwrap();

        let sum: f64 = deck.missing_cards.iter().map(|m| m.estimated_cost()).sum();
        prop_assert!(deck.missing_cards_value >= 0.0);
        prop_assert!((deck.missing_cards_value - sum).abs() < 1e-9);
    }

    #[test]
    fn prop_scoring_is_deterministic(
        owned in collection_strategy(),
        table in table_strategy(),
    ) {
        let scorer = BuildabilityScorer::new(ScoringConfig::default());
        let index = CollectionIndex::build(&owned);

        let first = scorer.score(&index, &table).unwrap();
        let second = scorer.score(&index, &table).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_lookup_ignores_case_and_padding(
        i in 0..CARD_POOL.len(),
        qty in 1..10u32,
        pad_left in 0..3usize,
        pad_right in 0..3usize,
    ) {
        let name = CARD_POOL[i];
        let index = CollectionIndex::build(&[OwnedCard::new(name, qty, 0)]);
        let padded = format!("{}{}{}", " ".repeat(pad_left), name.to_lowercase(), " ".repeat(pad_right));

        prop_assert_eq!(index.quantity_of(name), u64::from(qty));
        prop_assert_eq!(index.quantity_of(&padded), index.quantity_of(name));
        prop_assert_eq!(index.quantity_of(&name.to_uppercase()), index.quantity_of(name));
    }
}

#[test]
fn test_owned_staple_completes_deck() {
    let scorer = BuildabilityScorer::new(ScoringConfig::default());
    let index = CollectionIndex::build(&[OwnedCard::new("Sol Ring", 1, 0)]);
    let table = DeckCompositionTable::new(
        DeckKey::new("Test Commander"),
        vec![DeckCard::new("Sol Ring", 0.9, 0.0, CardCategory::Staple)],
    )
    .unwrap();

    let deck = scorer.score(&index, &table).unwrap();
    assert_eq!(deck.owned_cards, 1);
    assert_eq!(deck.total_cards, 1);
    assert_eq!(deck.completion_percentage, 1.0);
    assert_eq!(deck.buildability_score, 10.0);
    assert!(deck.missing_cards.is_empty());
}

#[test]
fn test_empty_collection_prices_missing_card() {
    let scorer = BuildabilityScorer::new(ScoringConfig::default());
    let index = CollectionIndex::build(&[]);
    let table = DeckCompositionTable::new(
        DeckKey::new("Test Commander"),
        vec![DeckCard::new("Eternal Witness", 0.78, 2.5, CardCategory::HighSynergy).with_price(3.50)],
    )
    .unwrap();

    let deck = scorer.score(&index, &table).unwrap();
    assert_eq!(deck.owned_cards, 0);
    assert_eq!(deck.completion_percentage, 0.0);
    assert_eq!(deck.buildability_score, 0.0);

    let entry = &deck.missing_cards[0];
    assert!((entry.impact_score() - 5.46).abs() < 1e-9);
    assert_eq!(entry.priority_level().as_str(), "critical");
    assert_eq!(entry.estimated_cost(), 3.50);
    assert_eq!(deck.missing_cards_value, 3.50);
}
