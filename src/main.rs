//! Program Catalogue Bot - Main Entry Point
//!
//! A Telegram bot that answers questions about master's programs:
//! program details, semester course lists, course search and
//! keyword-based course recommendations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use program_catalog_bot::catalogue::Catalogue;
use program_catalog_bot::commands::Router;
use program_catalog_bot::config::{BotSettings, RecommendationTable, TelegramConfig};
use program_catalog_bot::query::QueryEngine;
use program_catalog_bot::recommend::Recommender;
use program_catalog_bot::session::ConversationState;
use program_catalog_bot::telegram::{CatalogueBot, RunnerMessage, UpdateRunner};

/// Telegram bot answering questions about master's programs.
#[derive(Parser, Debug)]
#[command(name = "catalogue_bot")]
#[command(about = "Answer questions about master's programs over Telegram")]
#[command(version)]
struct Args {
    /// Path to the program catalogue JSON [default: $CATALOGUE_PATH or program_data.json].
    #[arg(short, long)]
    catalogue: Option<PathBuf>,

    /// Path to a keyword table replacing the built-in one [default: $KEYWORDS_PATH].
    #[arg(short, long)]
    keywords: Option<PathBuf>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Write the built-in keyword table to keywords.example.json and exit.
    #[arg(long)]
    generate_keywords: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    if args.generate_keywords {
        return generate_example_keywords();
    }

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut settings = BotSettings::from_env_with_defaults();
    if let Some(path) = args.catalogue {
        settings.catalogue_path = path;
    }
    if let Some(path) = args.keywords {
        settings.keywords_path = Some(path);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let catalogue = Catalogue::load(&settings.catalogue_path).with_context(|| {
        format!(
            "Failed to load catalogue from {}",
            settings.catalogue_path.display()
        )
    })?;
    if catalogue.is_empty() {
        warn!("Catalogue contains no programs");
    }

    let table = match &settings.keywords_path {
        Some(path) => RecommendationTable::load_from_file(path)
            .with_context(|| format!("Failed to load keyword table from {}", path.display()))?,
        None => RecommendationTable::default(),
    };
    info!("Using {} keyword rules", table.len());

    let queries = QueryEngine::new(Arc::new(catalogue), settings.search);
    let router = Arc::new(Router::new(
        queries,
        Recommender::new(table),
        Arc::new(ConversationState::new()),
    ));

    // Connect to Telegram
    let bot = CatalogueBot::connect(&tg_config, settings.min_send_interval_ms)
        .await
        .context("Failed to connect to Telegram")?;
    let bot = Arc::new(bot);

    let (runner_tx, runner_rx) = mpsc::channel::<RunnerMessage>(8);
    let runner = UpdateRunner::new(Arc::clone(&bot), router);

    info!("Bot is running. Use Ctrl+C to stop.");

    let runner_handle = tokio::spawn(async move {
        if let Err(e) = runner.run(runner_rx).await {
            error!("Update runner failed: {}", e);
        }
    });

    // Wait for Ctrl+C
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
    } else {
        info!("Received Ctrl+C, shutting down...");
    }

    // Cleanup
    let _ = runner_tx.send(RunnerMessage::Shutdown).await;
    let _ = runner_handle.await;
    bot.disconnect();

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Writes the built-in keyword table as an editable example.
fn generate_example_keywords() -> Result<()> {
    RecommendationTable::default().save_to_file("keywords.example.json")?;

    println!("✓ Example keyword table written to: keywords.example.json");
    println!("\nTo use it:");
    println!("1. Edit the keywords and course names");
    println!("2. Set KEYWORDS_PATH or pass --keywords keywords.example.json");

    Ok(())
}
