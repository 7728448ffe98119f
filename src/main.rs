//! Report Bot - Main Entry Point
//!
//! A Telegram bot that collects reports about users, groups and channels
//! and forwards them to a report channel and the admins.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use report_bot::config::{BotSettings, TelegramConfig};
use report_bot::conversation::ReportFlow;
use report_bot::reports::ReportStore;
use report_bot::telegram::dispatcher;

/// How often expired cooldowns and idle conversations are dropped from memory.
const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// Telegram bot for reporting users, groups and channels.
#[derive(Parser, Debug)]
#[command(name = "report_bot")]
#[command(about = "Collect reports about Telegram users, groups and channels")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load environment variables before logging so RUST_LOG from .env applies
    let env_loaded = dotenvy::from_filename(&args.env_file);

    init_logging(&args.log_level);

    if let Err(e) = env_loaded {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = BotSettings::from_env().context("Failed to load bot settings")?;

    info!(
        "Settings: {} admins, channel: {}, cooldown: {}s, max details: {} chars",
        settings.admin_ids.len(),
        settings.report_channel.as_deref().unwrap_or("none"),
        settings.report_cooldown_secs,
        settings.max_report_length
    );

    let store = ReportStore::open(&settings.reports_path)
        .await
        .with_context(|| format!("Failed to open {}", settings.reports_path.display()))?;

    let flow = Arc::new(ReportFlow::new(&settings, Arc::new(store)));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Spawn housekeeping
    let prune_flow = Arc::clone(&flow);
    let mut prune_shutdown = shutdown_rx.clone();
    let prune_handle = tokio::spawn(async move {
        let mut timer = interval(PRUNE_INTERVAL);
        loop {
            tokio::select! {
                _ = timer.tick() => {
                    let removed = prune_flow.cooldowns().prune().await;
                    if removed > 0 {
                        debug!("Pruned {} expired cooldowns", removed);
                    }
                    let idle = prune_flow.prune_conversations().await;
                    if idle > 0 {
                        debug!("Pruned {} idle conversations", idle);
                    }
                }
                _ = prune_shutdown.changed() => break,
            }
        }
    });

    info!("Starting report bot...");

    let mut bot_handle = {
        let flow = Arc::clone(&flow);
        let settings = settings.clone();
        tokio::spawn(async move { dispatcher::run(&tg_config, &settings, flow, shutdown_rx).await })
    };

    // Run until Ctrl+C or until the update loop stops on its own
    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            let _ = shutdown_tx.send(true);
            (&mut bot_handle).await
        }
        result = &mut bot_handle => result,
    };

    // Cleanup
    info!("Shutting down...");
    let _ = shutdown_tx.send(true);
    let _ = prune_handle.await;

    result
        .context("Update loop panicked")?
        .context("Telegram update loop failed")?;

    info!("Stored reports: {}", flow.store().len().await);
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
