//! Keyword Relay Bot - Main Entry Point
//!
//! Runs the userbot that watches groups and channels for keywords and the
//! official bot that admins use to control it.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use dialoguer::{Input, Password};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use keyword_relay_bot::actions::{AccountActions, SendPacer};
use keyword_relay_bot::auth::AuthorizationStore;
use keyword_relay_bot::commands::CommandHandler;
use keyword_relay_bot::config::{Settings, TelegramConfig};
use keyword_relay_bot::relay::{MessageFormatter, RelayEngine};
use keyword_relay_bot::telegram::{
    MessageReply, TelegramClient, TelegramError, Update, UserSession, bot_request,
    incoming_message,
};

/// Telegram userbot that relays keyword hits to a channel.
#[derive(Parser, Debug)]
#[command(name = "keyword_relay_bot")]
#[command(about = "Forward keyword matches from your Telegram groups to a channel")]
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

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configuration
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            for issue in e.issues() {
                error!("{}", issue);
            }
            bail!("{e}");
        }
    };

    // Load admins and keywords
    let store = AuthorizationStore::open(&settings.access)
        .context("Failed to open the admin and keyword stores")?;
    let store = Arc::new(RwLock::new(store));
    let tg = &settings.telegram;

    // Connect the userbot
    let (userbot, mut user_updates) =
        TelegramClient::connect("userbot", &tg.userbot_session_path, tg.api_id)
            .await
            .context("Failed to connect the userbot")?;

    if !userbot
        .is_authorized()
        .await
        .context("Failed to check userbot authorization")?
    {
        authenticate(&userbot, tg).await?;
    }

    // Connect the official bot
    let (bot, mut bot_updates) = TelegramClient::connect("bot", &tg.bot_session_path, tg.api_id)
        .await
        .context("Failed to connect the bot")?;

    if !bot
        .is_authorized()
        .await
        .context("Failed to check bot authorization")?
    {
        bot.bot_sign_in(&tg.bot_token, &tg.api_hash)
            .await
            .context("Bot sign in failed")?;
    }

    let userbot = Arc::new(userbot);
    match userbot.me().await {
        Ok(me) => info!("Userbot logged in as {} (ID: {})", me.full_name(), me.id),
        Err(e) => warn!("Could not read the userbot account: {}", e),
    }

    // Wire the relay and the command surface
    let mut relay = RelayEngine::new(
        Arc::clone(&userbot),
        Arc::clone(&store),
        MessageFormatter::default(),
        settings.relay.target_channel,
    );
    let handler = CommandHandler::new(
        Arc::clone(&store),
        AccountActions::new(
            Arc::clone(&userbot),
            SendPacer::new(settings.relay.broadcast_delay),
        ),
    );

    let mut heartbeat = tokio::time::interval(settings.relay.heartbeat_interval);
    heartbeat.tick().await;

    info!(
        "Relaying keyword matches to {}. Use Ctrl+C to stop.",
        relay.target()
    );

    // Run until Ctrl+C or an update stream fails
    let outcome = loop {
        tokio::select! {
            update = user_updates.next() => match update {
                Ok(Update::NewMessage(message)) => {
                    if let Some(incoming) = incoming_message(&message) {
                        let outcome = relay.process(&incoming).await;
                        debug!("Message {} in {}: {:?}", incoming.message_id, incoming.chat_id, outcome);
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(TelegramError::from(e)).context("Userbot update stream failed"),
            },
            update = bot_updates.next() => match update {
                Ok(Update::NewMessage(message)) => {
                    if let Some(request) = bot_request(&message) {
                        debug!("Received message from {}: {}", request.caller_id, request.text);
                        handler
                            .handle(request.caller_id, &request.text, &MessageReply(&message))
                            .await;
                    }
                }
                Ok(_) => {}
                Err(e) => break Err(TelegramError::from(e)).context("Bot update stream failed"),
            },
            _ = heartbeat.tick() => {
                let stats = relay.stats();
                info!(
                    "Heartbeat: {} received, {} matched, {} delivered, {} failed",
                    stats.received, stats.matched, stats.delivered, stats.failed
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break Ok(());
            }
        }
    };

    // Cleanup
    drop(relay);
    drop(handler);

    bot.shutdown().await;
    match Arc::try_unwrap(userbot) {
        Ok(userbot) => userbot.shutdown().await,
        Err(userbot) => userbot.disconnect(),
    }

    outcome
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Signs the userbot in interactively.
async fn authenticate(client: &TelegramClient, config: &TelegramConfig) -> Result<()> {
    info!("Userbot authentication required");

    let phone: String = Input::new()
        .with_prompt("Enter your phone number (with country code)")
        .interact_text()?;

    let token = client
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    info!("Login code sent to your Telegram app");

    let code: String = Input::new()
        .with_prompt("Enter the login code")
        .interact_text()?;

    match client.sign_in(&token, &code).await {
        Ok(()) => {
            info!("Successfully signed in!");
            Ok(())
        }
        Err(TelegramError::PasswordRequired(password_token)) => {
            info!("Two-factor authentication is enabled");
            info!("Password hint: {}", password_token.hint().unwrap_or("no hint"));

            let password: String = Password::new()
                .with_prompt("Enter your 2FA password")
                .interact()?;

            client
                .check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;

            info!("Successfully signed in with 2FA!");
            Ok(())
        }
        Err(e) => Err(e).context("Authentication failed"),
    }
}
