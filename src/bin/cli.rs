use clap::{Parser, Subcommand};
use commander_scout::config::AppConfig;
use commander_scout::providers::{EdhrecClient, MoxfieldClient, MoxfieldCsvImporter, StaticDeckSource};
use commander_scout::{RankingOptions, ScoutEngine, SortKey};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "commander-scout")]
#[command(about = "Find the Commander decks your collection can build", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database path (overrides config)
    #[arg(short, long, global = true)]
    db: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync a collection from the Moxfield API
    Sync {
        /// Moxfield username
        user: String,
    },

    /// Import a Moxfield CSV export
    Import {
        /// User the collection belongs to
        user: String,

        /// CSV export path
        csv: PathBuf,

        /// Only check the file
        #[arg(long)]
        validate_only: bool,
    },

    /// Load a static deck dataset (JSON) into the database
    LoadDecks {
        /// Dataset path
        json: PathBuf,
    },

    /// Fetch the most popular commanders and their decks from EDHREC
    UpdateDecks {
        /// Number of commanders to refresh
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Fetch a commander's deck statistics from EDHREC
    FetchDeck {
        /// Commander name
        commander: String,

        /// Archetype / theme
        #[arg(short, long)]
        archetype: Option<String>,
    },

    /// Recommend buildable decks
    Recommend {
        user: String,

        /// completion, buildability, popularity, power_level or budget
        #[arg(short, long)]
        sort_by: Option<String>,

        /// Minimum completion (0.0 - 1.0)
        #[arg(short, long)]
        min_completion: Option<f64>,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Maximum cost of missing cards (USD)
        #[arg(short, long)]
        budget_max: Option<f64>,

        /// Exact color identity, e.g. BG or W,U
        #[arg(long)]
        colors: Option<String>,
    },

    /// Score one deck against a collection
    Analyze {
        user: String,

        commander: String,

        #[arg(short, long)]
        archetype: Option<String>,

        /// Number of missing cards to list
        #[arg(long, default_value = "10")]
        show_missing: usize,
    },

    /// Summarize a user's stored collection
    Collection { user: String },

    /// Show database statistics
    Stats,
}

fn init_tracing(level: &str) {
    let default_directive = if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("commander_scout={}", level)
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Progress goes to the human-readable stream only; `--json` output stays parseable
struct Console<W: Write> {
    json: bool,
    out: W,
}

impl<W: Write> Console<W> {
    fn new(json: bool, out: W) -> Self {
        Self { json, out }
    }

    fn progress(&mut self, message: &str) -> io::Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "{}", message)
    }

    fn emit<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        writeln!(self.out, "{}", serde_json::to_string_pretty(value)?)?;
        Ok(())
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    init_tracing(&config.logging.level);

    let engine = ScoutEngine::open(config.database.resolved_path(), config.scoring).await?;
    let mut console = Console::new(cli.json, io::stdout());

    match cli.command {
        Commands::Sync { user } => {
            console.progress(&format!("🔄 Syncing Moxfield collection for {}...", user))?;

            let moxfield = MoxfieldClient::new(&config.moxfield.http_settings())?;
            let engine = engine.with_collection_source(Arc::new(moxfield));
            let report = engine.sync_collection(&user, None).await?;

            if cli.json {
                return console.emit(&report);
            }
            println!("✅ Synced {} rows", report.rows);
            println!("   Unique cards: {}", report.unique_cards);
            println!("   Total copies: {}", report.total_quantity);
        }

        Commands::Import { user, csv, validate_only } => {
            if validate_only {
                let rows = MoxfieldCsvImporter::new(&csv).validate()?;
                println!("✅ {} is valid: {} rows", csv.display(), rows);
                return Ok(());
            }

            console.progress(&format!("📥 Importing {} for {}...", csv.display(), user))?;
            let report = engine.import_csv(&user, &csv).await?;

            if cli.json {
                return console.emit(&report);
            }
            println!("✅ Imported {} rows", report.rows);
            println!("   Unique cards: {}", report.unique_cards);
            println!("   Total copies: {}", report.total_quantity);
        }

        Commands::LoadDecks { json } => {
            let dataset = StaticDeckSource::from_file(&json)?;
            let report = engine.load_dataset(&dataset).await?;

            if cli.json {
                return console.emit(&report);
            }
            println!(
                "✅ Loaded {} commanders and {} decks from {}",
                report.commanders,
                report.decks,
                json.display()
            );
        }

        Commands::UpdateDecks { limit } => {
            console.progress(&format!("🌐 Fetching the top {} commanders from EDHREC...", limit))?;

            let edhrec = EdhrecClient::new(&config.edhrec.http_settings())?;
            let engine = engine.with_deck_source(Arc::new(edhrec));
            let report = engine.refresh_top_commanders(limit).await?;

            if cli.json {
                return console.emit(&report);
            }
            println!("✅ Refreshed {}/{} commanders", report.refreshed, report.listed);
            if !report.failed.is_empty() {
                println!("⚠️  Failed: {}", report.failed.join(", "));
            }
        }

        Commands::FetchDeck { commander, archetype } => {
            console.progress(&format!("🌐 Fetching {} from EDHREC...", commander))?;

            let edhrec = EdhrecClient::new(&config.edhrec.http_settings())?;
            let engine = engine.with_deck_source(Arc::new(edhrec));
            let table = engine.refresh_deck(&commander, archetype.as_deref()).await?;

            if cli.json {
                return console.emit(&table);
            }
            println!("✅ Stored {} ({} cards)", table.key(), table.total_cards());
            println!("   Signature cards: {}", table.signature_cards().len());
        }

        Commands::Recommend {
            user,
            sort_by,
            min_completion,
            limit,
            budget_max,
            colors,
        } => {
            let defaults = config.recommendations.clone();
            let options = RankingOptions {
                sort_by: match sort_by {
                    Some(raw) => raw.parse::<SortKey>()?,
                    None => defaults.sort_by,
                },
                min_completion: min_completion.unwrap_or(defaults.min_completion),
                limit: limit.unwrap_or(defaults.limit),
                budget_max: budget_max.or(defaults.budget_max),
                colors: colors
                    .map(|raw| raw.split(',').map(|c| c.trim().to_string()).collect())
                    .or(defaults.colors),
            };

            let recommendations = engine.recommend(&user, &options).await?;

            if cli.json {
                return console.emit(&recommendations);
            }
            if recommendations.is_empty() {
                println!(
                    "🤷 No decks at {:.0}% completion or more for {}",
                    options.min_completion * 100.0,
                    user
                );
                return Ok(());
            }

            println!("🏆 Top decks for {} (by {}):\n", user, options.sort_by);
            for (i, rec) in recommendations.iter().enumerate() {
                let deck = &rec.deck;
                let colors = rec
                    .profile
                    .as_ref()
                    .map(|p| p.color_identity_str())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{:>3}. {} [{}] - {}",
                    i + 1,
                    deck.commander_name,
                    colors,
                    deck.archetype
                );
                println!(
                    "     Completion: {} ({}/{})  Buildability: {}",
                    deck.completion_display(),
                    deck.owned_cards,
                    deck.total_cards,
                    deck.buildability_display()
                );
                println!(
                    "     Missing: {} cards, ${:.2} ({})  High impact: {}  Priority: {:.1}",
                    deck.missing_cards_count(),
                    deck.missing_cards_value,
                    deck.affordability().as_str(),
                    deck.missing_high_impact_count(),
                    deck.priority_score()
                );
            }
        }

        Commands::Analyze {
            user,
            commander,
            archetype,
            show_missing,
        } => {
            let deck = engine
                .analyze_deck(&user, &commander, archetype.as_deref())
                .await?;

            if cli.json {
                return console.emit(&deck);
            }

            println!("🔍 {} ({}) for {}", deck.commander_name, deck.archetype, user);
            println!("   Completion: {} ({}/{})", deck.completion_display(), deck.owned_cards, deck.total_cards);
            println!("   Buildability: {}", deck.buildability_display());
            println!(
                "   Missing value: ${:.2} ({})",
                deck.missing_cards_value,
                deck.affordability().as_str()
            );
            if deck.is_highly_buildable() {
                println!("   ⭐ Highly buildable");
            }

            if show_missing > 0 && !deck.missing_cards.is_empty() {
                println!("\n📋 Missing cards:");
                for entry in deck.missing_cards.iter().take(show_missing) {
                    let marker = if engine.scorer().is_high_impact(entry.deck_card()) { "★" } else { " " };
                    println!(
                        " {} [{:<8}] {} (impact {:.2}, ${:.2})",
                        marker,
                        entry.priority_level().as_str(),
                        entry.card_name(),
                        entry.impact_score(),
                        entry.estimated_cost()
                    );
                }
                let hidden = deck.missing_cards.len().saturating_sub(show_missing);
                if hidden > 0 {
                    println!("   ... and {} more", hidden);
                }
            }
        }

        Commands::Collection { user } => {
            let summary = engine.collection_summary(&user).await?;

            if cli.json {
                return console.emit(&summary);
            }
            println!("🗂️  Collection for {}", summary.user);
            match (&summary.source, summary.last_sync) {
                (Some(source), Some(at)) => {
                    println!("   Synced from {} at {}", source, at.format("%Y-%m-%d %H:%M:%S"))
                }
                (Some(source), None) => println!("   Synced from {}", source),
                _ => println!("   Never synced"),
            }
            println!("   Rows: {}", summary.rows);
            println!("   Unique cards: {}", summary.unique_cards);
            println!("   Total copies: {} ({} foil)", summary.total_cards, summary.foil_cards);
        }

        Commands::Stats => {
            let stats = engine.store().stats().await?;

            if cli.json {
                return console.emit(&stats);
            }
            println!("📊 Database Statistics:");
            println!("   Users: {}", stats.users);
            println!("   Collection rows: {}", stats.collection_rows);
            println!("   Commanders: {}", stats.commanders);
            println!("   Deck tables: {}", stats.deck_tables);
            println!("   Deck cards: {}", stats.deck_cards);
            if let Some(last_sync) = stats.last_sync {
                println!("   Last sync: {}", last_sync.format("%Y-%m-%d %H:%M:%S"));
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commander_scout::SyncReport;

    fn report() -> SyncReport {
        SyncReport {
            user: "alice".to_string(),
            source: "moxfield".to_string(),
            rows: 3,
            unique_cards: 2,
            total_quantity: 4,
        }
    }

    #[test]
    fn test_json_output_has_no_progress_lines() {
        let mut console = Console::new(true, Vec::new());
        console.progress("🔄 Syncing Moxfield collection for alice...").unwrap();
        console.emit(&report()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&console.out).unwrap();
        assert_eq!(value["rows"], 3);
        assert_eq!(value["source"], "moxfield");
    }

    #[test]
    fn test_text_output_shows_progress() {
        let mut console = Console::new(false, Vec::new());
        console.progress("📥 Importing export.csv for alice...").unwrap();

        let text = String::from_utf8(console.out).unwrap();
        assert_eq!(text, "📥 Importing export.csv for alice...\n");
    }

    #[test]
    fn test_recommend_colors_flag_parses() {
        let cli = Cli::try_parse_from(["commander-scout", "recommend", "alice", "--colors", "B,G", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Recommend { colors, .. } => assert_eq!(colors.as_deref(), Some("B,G")),
            _ => panic!("expected recommend"),
        }
    }
}
