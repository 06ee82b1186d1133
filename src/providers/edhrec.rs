use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::collection::normalize;
use crate::core::{CardCategory, CommanderProfile, DeckCard};
use crate::deck::{DeckCompositionTable, DeckKey};
use crate::error::{Result, ScoutError};
use crate::providers::http::{HttpSettings, JsonHttpClient};
use crate::providers::DeckStatsSource;

const PROVIDER: &str = "edhrec";
const SIGNATURE_SYNERGY: f64 = 0.5;
/// Commanders ranked by decks built over the past year
const POPULAR_PAGE: &str = "commanders/year.json";
const BASIC_LANDS: [&str; 11] = [
    "plains",
    "island",
    "swamp",
    "mountain",
    "forest",
    "wastes",
    "snow-covered plains",
    "snow-covered island",
    "snow-covered swamp",
    "snow-covered mountain",
    "snow-covered forest",
];

/// EDHREC commander page JSON client
pub struct EdhrecClient {
    http: JsonHttpClient,
}

#[derive(Debug, Default, Deserialize)]
struct CommanderPage {
    #[serde(default)]
    num_decks_avg: Option<f64>,
    #[serde(default)]
    avg_price: Option<f64>,
    #[serde(default)]
    container: Container,
}

#[derive(Debug, Default, Deserialize)]
struct Container {
    #[serde(default)]
    json_dict: JsonDict,
}

#[derive(Debug, Default, Deserialize)]
struct JsonDict {
    #[serde(default)]
    card: Option<PageCard>,
    #[serde(default)]
    cardlists: Vec<CardList>,
}

#[derive(Debug, Default, Deserialize)]
struct PageCard {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color_identity: Vec<String>,
    #[serde(default)]
    salt: Option<f64>,
    #[serde(default)]
    rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CardList {
    #[serde(default)]
    tag: String,
    #[serde(default)]
    cardviews: Vec<CardView>,
}

#[derive(Debug, Deserialize)]
struct CardView {
    name: String,
    #[serde(default)]
    color_identity: Vec<String>,
    #[serde(default)]
    num_decks: f64,
    #[serde(default)]
    potential_decks: f64,
    #[serde(default)]
    synergy: f64,
}

/// EDHREC url slug: lower-case, runs of non-alphanumerics collapsed to `-`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch == '\'' {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

fn is_basic_land(name: &str) -> bool {
    BASIC_LANDS.contains(&normalize(name).as_str())
}

fn categorize(tag: &str, card_name: &str, synergy: f64) -> CardCategory {
    if is_basic_land(card_name) {
        return CardCategory::Basic;
    }
    let signature = synergy >= SIGNATURE_SYNERGY;
    match tag {
        "highsynergycards" if signature => CardCategory::Signature,
        "highsynergycards" => CardCategory::HighSynergy,
        "topcards" | "gamechangers" => CardCategory::Staple,
        _ if signature => CardCategory::Signature,
        _ => CardCategory::Staple,
    }
}

fn inclusion_rate(view: &CardView) -> f64 {
    if view.potential_decks > 0.0 {
        (view.num_decks / view.potential_decks).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn deck_from_page(key: DeckKey, page: &CommanderPage) -> Result<DeckCompositionTable> {
    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for list in &page.container.json_dict.cardlists {
        for view in &list.cardviews {
            if view.name.trim().is_empty() || !seen.insert(normalize(&view.name)) {
                continue;
            }
            cards.push(DeckCard::new(
                view.name.trim(),
                inclusion_rate(view),
                view.synergy,
                categorize(&list.tag, &view.name, view.synergy),
            ));
        }
    }

    if cards.is_empty() {
        return Err(ScoutError::provider(
            PROVIDER,
            format!("No card lists on page for {}", key),
        ));
    }

    DeckCompositionTable::new(key, cards)
}

fn profile_from_page(commander: &str, archetype: Option<&str>, page: &CommanderPage) -> Result<CommanderProfile> {
    let card = page.container.json_dict.card.as_ref();
    let name = card
        .map(|c| c.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(commander);

    let mut profile = CommanderProfile::new(name);
    profile.archetype = archetype.map(str::to_string);
    if let Some(card) = card {
        profile.color_identity = card.color_identity.iter().map(|c| c.to_uppercase()).collect();
        if let Some(salt) = card.salt {
            profile.salt_score = salt.clamp(0.0, 5.0);
        }
        if let Some(rank) = card.rank {
            profile.popularity_rank = rank.max(1);
        }
    }
    if let Some(decks) = page.num_decks_avg {
        profile.total_decks = decks.max(0.0).round() as u64;
    }
    if let Some(price) = page.avg_price {
        profile.avg_deck_price = price.max(0.0);
    }
    profile.budget_range = Some(profile.budget_category().to_string());

    profile.validate()?;
    Ok(profile)
}

/// Commanders from a ranking page in listed order, ranked from 1
fn commanders_from_listing(page: &CommanderPage, limit: usize) -> Result<Vec<CommanderProfile>> {
    let mut seen = HashSet::new();
    let mut commanders = Vec::new();

    let views = page
        .container
        .json_dict
        .cardlists
        .iter()
        .flat_map(|list| list.cardviews.iter());
    for view in views {
        if commanders.len() >= limit {
            break;
        }
        let name = view.name.trim();
        if name.is_empty() || !seen.insert(normalize(name)) {
            continue;
        }

        let mut profile = CommanderProfile::new(name);
        profile.color_identity = view.color_identity.iter().map(|c| c.to_uppercase()).collect();
        profile.total_decks = view.num_decks.max(0.0).round() as u64;
        profile.popularity_rank = (commanders.len() + 1) as u32;
        profile.validate()?;
        commanders.push(profile);
    }

    if commanders.is_empty() && limit > 0 {
        return Err(ScoutError::provider(PROVIDER, "No commanders on ranking page"));
    }
    Ok(commanders)
}

impl EdhrecClient {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        Ok(Self {
            http: JsonHttpClient::new(PROVIDER, settings)?,
        })
    }

    fn page_path(commander: &str, archetype: Option<&str>) -> Result<String> {
        let slug = slugify(commander);
        if slug.is_empty() {
            return Err(ScoutError::InvalidInput("Commander name cannot be empty".to_string()));
        }
        Ok(match archetype.map(slugify).filter(|a| !a.is_empty()) {
            Some(theme) => format!("commanders/{}/{}.json", slug, theme),
            None => format!("commanders/{}.json", slug),
        })
    }

    async fn fetch_page(&self, commander: &str, archetype: Option<&str>) -> Result<CommanderPage> {
        let path = Self::page_path(commander, archetype)?;
        debug!("Fetching EDHREC page {}", path);
        self.http.get_json(&path).await
    }
}

#[async_trait]
impl DeckStatsSource for EdhrecClient {
    async fn fetch_deck(&self, commander: &str, archetype: Option<&str>) -> Result<DeckCompositionTable> {
        let page = self.fetch_page(commander, archetype).await?;

        let mut key = DeckKey::new(commander.trim());
        if let Some(archetype) = archetype {
            key = key.with_archetype(archetype);
        }
        let table = deck_from_page(key, &page)?;

        info!("EDHREC deck for {}: {} cards", table.key(), table.total_cards());
        Ok(table)
    }

    async fn commander_profile(&self, commander: &str) -> Result<Option<CommanderProfile>> {
        let page = self.fetch_page(commander, None).await?;
        profile_from_page(commander.trim(), None, &page).map(Some)
    }

    async fn list_commanders(&self, limit: usize) -> Result<Vec<CommanderProfile>> {
        let page: CommanderPage = self.http.get_json(POPULAR_PAGE).await?;
        let commanders = commanders_from_listing(&page, limit)?;
        info!("EDHREC listed {} popular commanders", commanders.len());
        Ok(commanders)
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
