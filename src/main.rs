use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ladder_tracker::calculate::{mmr_ratio, score_ratio};
use ladder_tracker::config::AppConfig;
use ladder_tracker::ingest::LogImporter;
use ladder_tracker::storage::{load_store, save_store, StorageConfig};
use ladder_tracker::{LeaderboardStore, PlayerHistory};

#[derive(Parser)]
#[command(name = "ladder-tracker")]
#[command(about = "World ladder tracker with composite player scoring")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import new ladder snapshots from the game logs
    Import {
        /// Log directory (default: <game_dir>/ProjectDatas/Log)
        #[arg(long)]
        log_dir: Option<PathBuf>,
    },

    /// Print the ranked leaderboard
    List {
        /// Only show the top N players
        #[arg(long)]
        limit: Option<usize>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one player's details by id or name
    Show { player: String },

    /// Compare two sides of players by score and mmr
    Matchup {
        /// Left side player ids or names (comma-separated)
        #[arg(long, value_delimiter = ',')]
        left: Vec<String>,

        /// Right side player ids or names (comma-separated)
        #[arg(long, value_delimiter = ',')]
        right: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::debug!("Starting ladder-tracker v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let records_path = storage.records_path();
    let empty = LeaderboardStore::new().with_worst_world_rank(config.leaderboard.worst_world_rank);
    let mut store = load_store(&records_path, empty)?;

    match cli.command {
        Commands::Import { log_dir } => {
            let log_dir = log_dir.unwrap_or_else(|| config.log_dir());
            tracing::info!("Importing new records from {:?}", log_dir);

            let importer = LogImporter::new(config.leaderboard.expected_players)?;
            let (imported, stats) = importer.import_dir(&log_dir)?;
            if stats.skipped_snapshots > 0 {
                tracing::warn!("Skipped {} malformed snapshots", stats.skipped_snapshots);
            }

            store.merge_from(imported);
            if store.is_empty() {
                tracing::warn!("No ladder data found yet; nothing to rank");
                return Ok(());
            }

            store.recompute()?;
            if let Some(latest) = store.latest_timestamp() {
                tracing::info!("Leaderboard latest record is: {}", latest);
            }

            save_store(&records_path, &store)?;
        }

        Commands::List { limit, json } => {
            let players = store.players()?;
            let shown = limit.unwrap_or(players.len()).min(players.len());
            let players = &players[..shown];

            if json {
                println!("{}", serde_json::to_string_pretty(players)?);
            } else {
                println!(
                    "{:>4}  {:>8}  {:<24} {:>6} {:>7}  {}",
                    "RANK", "SCORE", "NAME", "MMR", "POWER", "COLOR"
                );
                for p in players {
                    println!(
                        "{:>4}  {:>8}  {:<24} {:>6} {:>7}  {}",
                        p.score_rank.unwrap_or(0),
                        p.score.map(|s| s.to_string()).unwrap_or_default(),
                        p.current_name,
                        p.current_metrics.mmr,
                        p.current_metrics.power,
                        p.display_color
                    );
                }
            }
        }

        Commands::Show { player } => {
            store.players()?;
            let found = resolve(&store, &player)?;
            print_player(found);
        }

        Commands::Matchup { left, right } => {
            if left.is_empty() || right.is_empty() {
                bail!("Both --left and --right need at least one player");
            }

            store.players()?;
            let left = left
                .iter()
                .map(|p| resolve(&store, p))
                .collect::<Result<Vec<_>>>()?;
            let right = right
                .iter()
                .map(|p| resolve(&store, p))
                .collect::<Result<Vec<_>>>()?;

            let by_score = score_ratio(&left, &right, store.min_score());
            let by_mmr = mmr_ratio(&left, &right, store.global_min_metrics().mmr);

            println!(
                "Score ratio: {:.1}% left / {:.1}% right",
                by_score * 100.0,
                (1.0 - by_score) * 100.0
            );
            println!(
                "MMR ratio:   {:.1}% left / {:.1}% right",
                by_mmr * 100.0,
                (1.0 - by_mmr) * 100.0
            );
        }
    }

    Ok(())
}

/// Look a player up by id first, then by current name or alias.
fn resolve<'a>(store: &'a LeaderboardStore, key: &str) -> Result<&'a PlayerHistory> {
    let key = key.trim();
    if let Some(player) = store.player(key) {
        return Ok(player);
    }

    match store.find_by_name(key).as_slice() {
        [] => bail!("No player matches '{}'", key),
        [single] => Ok(*single),
        many => {
            let ids: Vec<String> = many.iter().map(|p| p.id.to_string()).collect();
            bail!("'{}' is ambiguous, matching ids: {}", key, ids.join(", "))
        }
    }
}

fn print_player(p: &PlayerHistory) {
    println!("{} ({})", p.current_name, p.id);
    if !p.aliases.is_empty() {
        let aliases: Vec<&str> = p.aliases.iter().map(String::as_str).collect();
        println!("  aliases:  {}", aliases.join(", "));
    }
    println!(
        "  rank:     {} (score {}, color {})",
        p.score_rank.unwrap_or(0),
        p.score.map(|s| s.to_string()).unwrap_or_default(),
        p.display_color
    );
    println!("  records:  {} (latest {})", p.records().len(), p.latest_timestamp());
    println!("  {:<8} {:>6} {:>7} {:>6}", "", "MMR", "POWER", "WINS");
    for (label, m) in [
        ("current", &p.current_metrics),
        ("min", &p.min_metrics),
        ("median", &p.median_metrics),
        ("max", &p.max_metrics),
    ] {
        println!("  {:<8} {:>6} {:>7} {:>6}", label, m.mmr, m.power, m.total_wins);
    }
}
