mod admin;
mod bot;
mod classifier;
mod config;
mod error;
mod export;
mod handlers;
mod scheduler;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::AppState;
use crate::config::{Config, FeatureFlags};
use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,probot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.ensure_ready()?;
    if !config.validate().features_configured {
        warn!("Every feature flag is disabled; the bot will only answer commands");
    }

    info!("Configuration loaded successfully");
    info!("  Bot: {} v{}", config.bot.name, config.bot.version);
    info!(
        "  Features enabled: {}/{}",
        config.features.enabled_count(),
        FeatureFlags::NAMES.len()
    );

    let state = Arc::new(AppState::new(config));
    info!("  Admins: {}", state.admins.len());

    let mut scheduler = Scheduler::new().await?;
    scheduler.register_builtin(state.clone()).await?;
    if !scheduler.is_idle() {
        scheduler.start().await?;
    }

    info!("Bot is starting...");
    bot::run(state).await?;

    if !scheduler.is_idle() {
        scheduler.shutdown().await?;
    }

    Ok(())
}
