use commander_scout::providers::StaticDeckSource;
use commander_scout::{
    PriorityLevel, RankingOptions, ScoringConfig, ScoutEngine, ScoutError, SortKey,
};
use std::io::Write;
use tempfile::NamedTempFile;

const DATASET: &str = r#"{
    "commanders": [
        {
            "name": "Atraxa, Praetors' Voice",
            "color_identity": ["W", "U", "B", "G"],
            "total_decks": 30000,
            "popularity_rank": 2,
            "avg_deck_price": 650.0,
            "power_level": 7.5
        },
        {
            "name": "Krenko, Mob Boss",
            "color_identity": ["R"],
            "total_decks": 12000,
            "popularity_rank": 40,
            "avg_deck_price": 180.0,
            "power_level": 6.0
        }
    ],
    "decks": [
        {
            "commander": "Atraxa, Praetors' Voice",
            "archetype": "superfriends",
            "budget_range": "high",
            "cards": [
                {"card_name": "Sol Ring", "inclusion_rate": 0.95, "category": "staple", "price_usd": 1.5},
                {"card_name": "Doubling Season", "inclusion_rate": 0.82, "synergy_score": 0.6, "category": "signature", "price_usd": 60.0},
                {"card_name": "Deepglow Skate", "inclusion_rate": 0.55, "synergy_score": 0.4, "category": "high_synergy", "price_usd": 3.0},
                {"card_name": "Command Tower", "inclusion_rate": 0.98, "category": "staple"}
            ]
        },
        {
            "commander": "Krenko, Mob Boss",
            "cards": [
                {"card_name": "Sol Ring", "inclusion_rate": 0.93, "category": "staple", "price_usd": 1.5},
                {"card_name": "Skirk Prospector", "inclusion_rate": 0.71, "synergy_score": 0.5, "category": "signature", "price_usd": 0.5},
                {"card_name": "Mountain", "inclusion_rate": 1.0, "category": "basic"}
            ]
        }
    ]
}"#;

const COLLECTION_CSV: &str = "\
Count,Tradelist Count,Name,Edition,Condition,Language,Foil
1,0,Sol Ring,cmr,Near Mint,English,
1,0,Command Tower,cmr,Near Mint,English,foil
2,0,Skirk Prospector,dmr,Near Mint,English,
20,0,Mountain,one,Near Mint,English,
";

async fn seeded_engine() -> (ScoutEngine, NamedTempFile) {
    let engine = ScoutEngine::open(":memory:", ScoringConfig::default()).await.unwrap();

    let dataset = StaticDeckSource::from_json_str(DATASET).unwrap();
    let report = engine.load_dataset(&dataset).await.unwrap();
    assert_eq!(report.commanders, 2);
    assert_eq!(report.decks, 2);

    let mut csv = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    csv.write_all(COLLECTION_CSV.as_bytes()).unwrap();
    csv.flush().unwrap();

    let sync = engine.import_csv("alice", csv.path()).await.unwrap();
    assert_eq!(sync.rows, 4);
    assert_eq!(sync.unique_cards, 4);
    assert_eq!(sync.total_quantity, 24);

    (engine, csv)
}

#[tokio::test]
async fn test_import_then_recommend() {
    let (engine, _csv) = seeded_engine().await;

    let options = RankingOptions {
        sort_by: SortKey::Completion,
        min_completion: 0.0,
        ..Default::default()
    };
    let recs = engine.recommend("alice", &options).await.unwrap();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].deck.commander_name, "Krenko, Mob Boss");
    assert!((recs[0].deck.completion_percentage - 1.0).abs() < 1e-9);
    assert_eq!(recs[1].deck.commander_name, "Atraxa, Praetors' Voice");
    assert!((recs[1].deck.completion_percentage - 0.5).abs() < 1e-9);

    // Profiles loaded with the dataset are attached to the results
    let krenko = recs[0].profile.as_ref().unwrap();
    assert_eq!(krenko.color_identity_str(), "R");
}

#[tokio::test]
async fn test_recommend_default_threshold_filters_partial_decks() {
    let (engine, _csv) = seeded_engine().await;

    let recs = engine.recommend("alice", &RankingOptions::default()).await.unwrap();
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].deck.commander_name, "Krenko, Mob Boss");
}

#[tokio::test]
async fn test_recommend_by_popularity() {
    let (engine, _csv) = seeded_engine().await;

    let options = RankingOptions {
        sort_by: SortKey::Popularity,
        min_completion: 0.0,
        ..Default::default()
    };
    let recs = engine.recommend("alice", &options).await.unwrap();
    assert_eq!(recs[0].deck.commander_name, "Atraxa, Praetors' Voice");
}

#[tokio::test]
async fn test_recommend_budget_filter() {
    let (engine, _csv) = seeded_engine().await;

    let options = RankingOptions {
        min_completion: 0.0,
        budget_max: Some(10.0),
        ..Default::default()
    };
    let recs = engine.recommend("alice", &options).await.unwrap();

    // Atraxa is missing $63 of cards
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].deck.commander_name, "Krenko, Mob Boss");
}

#[tokio::test]
async fn test_analyze_lists_missing_by_priority() {
    let (engine, _csv) = seeded_engine().await;

    let deck = engine
        .analyze_deck("alice", "atraxa, praetors' voice", Some("superfriends"))
        .await
        .unwrap();

    assert_eq!(deck.owned_cards, 2);
    assert_eq!(deck.total_cards, 4);
    assert_eq!(deck.budget_range.as_deref(), Some("high"));
    assert!((deck.missing_cards_value - 63.0).abs() < 1e-9);

    // 0.82 * 3.0 * 1.6 = 3.936 vs 0.55 * 2.0 * 1.4 = 1.54
    assert_eq!(deck.missing_cards.len(), 2);
    assert_eq!(deck.missing_cards[0].card_name(), "Doubling Season");
    assert_eq!(deck.missing_cards[0].priority_level(), PriorityLevel::Critical);
    assert_eq!(deck.missing_cards[1].card_name(), "Deepglow Skate");
    assert_eq!(deck.missing_cards[1].priority_level(), PriorityLevel::Medium);
    assert_eq!(deck.missing_high_impact_count(), 1);
}

#[tokio::test]
async fn test_analyze_unknown_archetype_lists_available() {
    let (engine, _csv) = seeded_engine().await;

    let err = engine
        .analyze_deck("alice", "Atraxa, Praetors' Voice", Some("infect"))
        .await
        .unwrap_err();

    match err {
        ScoutError::NotFound(msg) => assert!(msg.contains("superfriends")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_analyze_misspelled_commander_suggests() {
    let (engine, _csv) = seeded_engine().await;

    let err = engine.analyze_deck("alice", "Krenko Mob Bos", None).await.unwrap_err();
    match err {
        ScoutError::NotFound(msg) => assert!(msg.contains("Krenko, Mob Boss")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_user_gets_no_recommendations() {
    let (engine, _csv) = seeded_engine().await;

    let recs = engine.recommend("bob", &RankingOptions::default()).await.unwrap();
    assert!(recs.is_empty());
}

#[tokio::test]
async fn test_reimport_replaces_collection() {
    let (engine, _csv) = seeded_engine().await;

    let mut smaller = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    smaller
        .write_all(b"Count,Name,Edition\n1,Sol Ring,cmr\n")
        .unwrap();
    smaller.flush().unwrap();

    engine.import_csv("alice", smaller.path()).await.unwrap();

    let stats = engine.store().stats().await.unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.collection_rows, 1);
    assert_eq!(stats.commanders, 2);
    assert_eq!(stats.deck_tables, 2);
    assert_eq!(stats.deck_cards, 7);
    assert!(stats.last_sync.is_some());
}

#[tokio::test]
async fn test_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("scout.db");
    let db_path = db_path.to_str().unwrap();

    {
        let engine = ScoutEngine::open(db_path, ScoringConfig::default()).await.unwrap();
        let dataset = StaticDeckSource::from_json_str(DATASET).unwrap();
        engine.load_dataset(&dataset).await.unwrap();
    }

    let engine = ScoutEngine::open(db_path, ScoringConfig::default()).await.unwrap();
    let stats = engine.store().stats().await.unwrap();
    assert_eq!(stats.deck_tables, 2);
    assert_eq!(stats.commanders, 2);
}
