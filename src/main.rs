use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use match_analytics::api::{build_router, state::AppState};
use match_analytics::config::AppConfig;
use match_analytics::models::{Hero, MapId, Stat};
use match_analytics::pipeline::MatchAnalyzer;
use match_analytics::storage::{list_maps, JsonlStore, StorageConfig};

#[derive(Parser)]
#[command(name = "match-analytics")]
#[command(about = "Match analytics engine for hero shooter telemetry")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

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
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Full analytical report for a map
    Report { map_id: String },

    /// Kills of a map grouped into fights
    Fights { map_id: String },

    /// Per-round deltas of one statistic for one player
    Deltas {
        map_id: String,

        #[arg(long)]
        player: String,

        /// Statistic name (e.g. "eliminations", "hero_damage_dealt")
        #[arg(long)]
        stat: String,
    },

    /// MVP scores for a map
    Mvp { map_id: String },

    /// Composite ratings for a player
    Rating {
        map_id: String,

        #[arg(long)]
        player: String,

        /// Only rate this hero
        #[arg(long)]
        hero: Option<String>,
    },

    /// Derived combat metrics for a player
    Combat {
        map_id: String,

        #[arg(long)]
        player: String,
    },

    /// List maps in the data directory
    ListMaps,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("Failed to load config from {}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

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

    tracing::info!("Starting match-analytics v{}", env!("CARGO_PKG_VERSION"));

    let storage = StorageConfig::new(config.data_dir.clone());
    let store = JsonlStore::new(storage.clone());
    let analyzer = MatchAnalyzer::new(Arc::new(store), config.analytics.clone());

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let cors_origin = Some(config.server.cors_origin.clone()).filter(|o| o != "*");

            let state = AppState::new(analyzer)
                .with_storage(storage)
                .with_cors_origin(cors_origin);
            let app = build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Serving data from {:?} on http://{}", config.data_dir, addr);
            axum::serve(listener, app).await?;
        }
        Commands::Report { map_id } => {
            let report = analyzer.report(&MapId::new(map_id)).await?;
            print_json(&report)?;
        }
        Commands::Fights { map_id } => {
            let fights = analyzer.fights(&MapId::new(map_id)).await?;
            print_json(&fights)?;
        }
        Commands::Deltas {
            map_id,
            player,
            stat,
        } => {
            let stat: Stat = stat.parse().map_err(anyhow::Error::msg)?;
            let deltas = analyzer
                .round_deltas(&MapId::new(map_id), &player, stat)
                .await?;
            print_json(&deltas)?;
        }
        Commands::Mvp { map_id } => {
            let report = analyzer.mvp(&MapId::new(map_id)).await?;
            print_json(&report)?;
        }
        Commands::Rating {
            map_id,
            player,
            hero,
        } => {
            let hero = hero.as_deref().map(str::parse::<Hero>).transpose()?;
            let ratings = analyzer.ratings(&MapId::new(map_id), &player, hero).await?;
            print_json(&ratings)?;
        }
        Commands::Combat { map_id, player } => {
            let metrics = analyzer.combat(&MapId::new(map_id), &player).await?;
            print_json(&metrics)?;
        }
        Commands::ListMaps => {
            let maps = list_maps(&storage)?;
            if maps.is_empty() {
                println!("No maps found in {:?}", storage.maps_dir());
            }
            for map in maps {
                println!("{}", map);
            }
        }
    }

    Ok(())
}
