mod bot;
mod command;
mod config;
mod lock;
mod notify;
mod platform;
mod random_org;
mod reply;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bot::Bot;
use crate::config::Config;
use crate::notify::SmtpMailer;
use crate::platform::reddit::RedditClient;
use crate::random_org::RandomOrgClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,randombot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("randombot.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Environment: {}", config.bot.environment);
    info!("  Bot account: u/{}", config.reddit.username);
    info!(
        "  Operator: u/{} <{}>",
        config.bot.operator_user, config.bot.operator_email
    );
    info!("  Poll interval: {}s", config.bot.poll_interval_secs);

    let inbox = Arc::new(RedditClient::new(config.reddit.clone()));
    let rng = Arc::new(RandomOrgClient::new(config.bot.random_org_api_key.clone()));
    let mailer = Arc::new(SmtpMailer::new(config.email.clone()));

    let bot = Bot::new(&config, inbox, rng, mailer);

    info!("Bot is starting...");
    bot.run().await?;

    Ok(())
}
