mod access;
mod bot;
mod config;
mod error;
mod keepalive;
mod like_api;
mod markdown;
mod quota;
mod reset;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Likebot starting...");

    // Load configuration; a missing bot token is fatal before any network I/O
    let config = config::load_config()?;
    tracing::info!(
        allowed_groups = config.allowed_groups.len(),
        admins = config.admin_ids.len(),
        "Configuration loaded"
    );

    let like_client = like_api::LikeClient::new(&config.like_api_url, config.like_api_timeout_ms)?;

    // Build shared state
    let state = bot::AppState::new(config.clone(), like_client);

    // Liveness probe for the hosting platform
    tokio::spawn(keepalive::run_keepalive(config.keepalive_port));

    // Daily quota reset task
    tokio::spawn(reset::run_daily_reset(
        state.quotas.clone(),
        config.reset_hour,
        config.reset_minute,
    ));

    // Create bot
    let bot = Bot::new(&config.telegram_token);

    // Register commands with Telegram
    if let Err(e) = bot
        .set_my_commands(bot::commands::BotCommand::bot_commands())
        .await
    {
        tracing::warn!("Failed to set bot commands: {e}");
    }

    tracing::info!("Bot starting polling...");

    // Build and run dispatcher
    bot::build_and_run(bot, state).await;

    Ok(())
}
