use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::core::OwnedCard;
use crate::error::{Result, ScoutError};
use crate::providers::http::{HttpSettings, JsonHttpClient};
use crate::providers::CollectionSource;

const PROVIDER: &str = "moxfield";

/// Moxfield collection API client
pub struct MoxfieldClient {
    http: JsonHttpClient,
}

#[derive(Debug, Deserialize)]
struct CardRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    card: Option<CardRef>,
    #[serde(default)]
    quantity: i64,
    #[serde(default)]
    foil_quantity: i64,
    #[serde(default)]
    etched_quantity: i64,
}

impl CollectionItem {
    fn card_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        self.card.as_ref().map(|c| c.name.as_str()).unwrap_or("")
    }
}

impl MoxfieldClient {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            http: JsonHttpClient::new(PROVIDER, settings)?,
        })
    }

    /// Raw collection rows for `username`
    pub async fn get_collection(&self, username: &str) -> Result<Vec<OwnedCard>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ScoutError::InvalidInput("Username cannot be empty".to_string()));
        }

        let path = format!("users/{}/collection", urlencoding::encode(username));
        let items: BTreeMap<String, CollectionItem> = self.http.get_json(&path).await?;
        let cards = collection_from_items(username, items)?;

        let copies: u64 = cards.iter().map(|c| u64::from(c.total_quantity())).sum();
        info!("Retrieved Moxfield collection for {}: {} rows, {} copies", username, cards.len(), copies);

        Ok(cards)
    }
}

/// Convert the id-keyed API payload into rows; etched copies count as foil
fn collection_from_items(username: &str, items: BTreeMap<String, CollectionItem>) -> Result<Vec<OwnedCard>> {
    let mut cards = Vec::with_capacity(items.len());

    for (id, item) in items {
        let name = item.card_name().trim().to_string();
        if name.is_empty() {
            warn!("Skipping Moxfield item {} for {}: no card name", id, username);
            continue;
        }

        // Checked before summing
        for (field, value) in [
            ("foilQuantity", item.foil_quantity),
            ("etchedQuantity", item.etched_quantity),
        ] {
            if value < 0 {
                return Err(ScoutError::contract(
                    field,
                    value,
                    format!("Moxfield item {} '{}'", id, name),
                ));
            }
        }

        let foil = item.foil_quantity.saturating_add(item.etched_quantity);
        cards.push(OwnedCard::try_new(name, item.quantity, foil)?);
    }

    Ok(cards)
}

#[async_trait]
impl CollectionSource for MoxfieldClient {
    async fn fetch_collection(&self, user: &str) -> Result<Vec<OwnedCard>> {
        self.get_collection(user).await
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<Vec<OwnedCard>> {
        let items: BTreeMap<String, CollectionItem> = serde_json::from_str(body).unwrap();
        collection_from_items("tester", items)
    }

    #[test]
    fn test_parse_collection_payload() {
        let cards = parse(
            r#"{
                "a1": {"name": "Sol Ring", "quantity": 2, "foilQuantity": 1},
                "b2": {"card": {"name": "Arcane Signet"}, "quantity": 0, "etchedQuantity": 1},
                "c3": {"name": "Command Tower", "quantity": 1, "foilQuantity": 1, "etchedQuantity": 2}
            }"#,
        )
        .unwrap();

        assert_eq!(cards.len(), 3);
        assert_eq!(cards[0], OwnedCard::new("Sol Ring", 2, 1));
        assert_eq!(cards[1], OwnedCard::new("Arcane Signet", 0, 1));
        assert_eq!(cards[2].foil_quantity, 3);
    }

    #[test]
    fn test_nameless_items_are_skipped() {
        let cards = parse(r#"{"x": {"quantity": 3}, "y": {"name": "Sol Ring", "quantity": 1}}"#).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_negative_quantity_is_contract_violation() {
        let err = parse(r#"{"x": {"name": "Sol Ring", "quantity": -1}}"#).unwrap_err();
        assert!(matches!(err, ScoutError::ContractViolation { .. }));
    }

    #[test]
    fn test_negative_foil_offset_by_etched_is_rejected() {
        let err = parse(
            r#"{"x": {"name": "Sol Ring", "quantity": 1, "foilQuantity": -1, "etchedQuantity": 1}}"#,
        )
        .unwrap_err();
        match err {
            ScoutError::ContractViolation { field, value, .. } => {
                assert_eq!(field, "foilQuantity");
                assert_eq!(value, "-1");
            }
            other => panic!("expected ContractViolation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let settings = HttpSettings {
            base_url: "https://api2.moxfield.com/v2".to_string(),
            timeout_secs: 5,
            max_retries: 1,
            retry_delay_secs: 0.0,
            rate_limit: 2.0,
            user_agent: "commander-scout-test".to_string(),
        };
        let client = MoxfieldClient::new(&settings).unwrap();
        let err = client.get_collection("   ").await.unwrap_err();
        assert!(matches!(err, ScoutError::InvalidInput(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_live_collection() {
        let settings = HttpSettings {
            base_url: "https://api2.moxfield.com/v2".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            retry_delay_secs: 1.0,
            rate_limit: 2.0,
            user_agent: "commander-scout-test".to_string(),
        };
        let client = MoxfieldClient::new(&settings).unwrap();
        let result = client.get_collection("moxfield").await;
        assert!(result.is_ok() || matches!(result, Err(ScoutError::NotFound(_))));
    }
}
