//! Application settings and Telegram configuration.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use super::channel::ChannelId;

/// Telegram API configuration shared by the userbot and the admin bot.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Token of the admin bot, issued by `@BotFather`.
    pub bot_token: String,

    /// Session file of the userbot account.
    pub userbot_session_path: PathBuf,

    /// Session file of the admin bot.
    pub bot_session_path: PathBuf,
}

fn default_userbot_session_path() -> PathBuf {
    PathBuf::from("userbot.session")
}

fn default_bot_session_path() -> PathBuf {
    PathBuf::from("bot.session")
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("api_hash", &redact(&self.api_hash))
            .field("bot_token", &redact(&self.bot_token))
            .field("userbot_session_path", &self.userbot_session_path)
            .field("bot_session_path", &self.bot_session_path)
            .finish()
    }
}

/// Settings of the relay pipeline and the account actions.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    /// Channel that receives keyword matches.
    pub target_channel: ChannelId,

    /// Pause between two sends of a broadcast.
    pub broadcast_delay: Duration,

    /// Interval of the heartbeat that logs relay counters.
    pub heartbeat_interval: Duration,
}

fn default_broadcast_delay_ms() -> u64 {
    500
}

fn default_heartbeat_secs() -> u64 {
    300
}

/// Initial authorization data and the files backing it.
#[derive(Debug, Clone)]
pub struct AccessSettings {
    /// Owner account id, 0 when unset.
    pub owner_id: i64,

    /// Admin ids from `ADMIN_IDS` and the legacy `ADMIN_ID`.
    ///
    /// Only used when the admin file does not exist yet.
    pub admin_ids: Vec<i64>,

    /// JSON file holding the admin id list.
    pub admins_path: PathBuf,

    /// JSON file holding the keyword list.
    pub keywords_path: PathBuf,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            owner_id: 0,
            admin_ids: Vec::new(),
            admins_path: PathBuf::from("admins.json"),
            keywords_path: PathBuf::from("keywords.json"),
        }
    }
}

/// Complete application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram: TelegramConfig,
    pub relay: RelaySettings,
    pub access: AccessSettings,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Required: `API_ID`, `API_HASH`, `BOT_TOKEN`, `TARGET_CHANNEL`.
    ///
    /// # Errors
    ///
    /// Returns every missing or invalid required field at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let mut issues = Vec::new();

        let api_id = match var("API_ID") {
            None => {
                issues.push(FieldIssue::new("API_ID", "API_ID is not set"));
                None
            }
            Some(raw) => match raw.parse::<i32>() {
                Ok(id) if id > 0 => Some(id),
                _ => {
                    issues.push(FieldIssue::new(
                        "API_ID",
                        "API_ID must be a positive integer",
                    ));
                    None
                }
            },
        };

        let api_hash = var("API_HASH");
        if api_hash.is_none() {
            issues.push(FieldIssue::new("API_HASH", "API_HASH is not set"));
        }

        let bot_token = var("BOT_TOKEN");
        if bot_token.is_none() {
            issues.push(FieldIssue::new("BOT_TOKEN", "BOT_TOKEN is not set"));
        }

        let target_channel = match var("TARGET_CHANNEL") {
            None => {
                issues.push(FieldIssue::new("TARGET_CHANNEL", "TARGET_CHANNEL is not set"));
                None
            }
            Some(raw) => match ChannelId::parse(&raw) {
                Ok(id) => Some(id),
                Err(e) => {
                    issues.push(FieldIssue::new(
                        "TARGET_CHANNEL",
                        format!("TARGET_CHANNEL is invalid: {e}"),
                    ));
                    None
                }
            },
        };

        let (Some(api_id), Some(api_hash), Some(bot_token), Some(target_channel)) =
            (api_id, api_hash, bot_token, target_channel)
        else {
            return Err(ConfigError::Invalid(issues));
        };

        let telegram = TelegramConfig {
            api_id,
            api_hash,
            bot_token,
            userbot_session_path: var("USERBOT_SESSION_PATH")
                .map_or_else(default_userbot_session_path, PathBuf::from),
            bot_session_path: var("BOT_SESSION_PATH")
                .map_or_else(default_bot_session_path, PathBuf::from),
        };

        let relay = RelaySettings {
            target_channel,
            broadcast_delay: Duration::from_millis(
                var("BROADCAST_DELAY_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_broadcast_delay_ms),
            ),
            heartbeat_interval: Duration::from_secs(
                var("HEARTBEAT_SECS")
                    .and_then(|s| s.parse().ok())
                    .filter(|&secs| secs > 0)
                    .unwrap_or_else(default_heartbeat_secs),
            ),
        };

        let mut admin_ids = var("ADMIN_IDS")
            .map(|raw| parse_admin_list(&raw))
            .unwrap_or_default();
        if let Some(legacy) = var("ADMIN_ID").as_deref().and_then(parse_legacy_admin)
            && !admin_ids.contains(&legacy)
        {
            admin_ids.push(legacy);
        }

        let defaults = AccessSettings::default();
        let access = AccessSettings {
            owner_id: var("OWNER_ID").map_or(0, |raw| parse_owner_id(&raw)),
            admin_ids,
            admins_path: var("ADMINS_FILE").map_or(defaults.admins_path, PathBuf::from),
            keywords_path: var("KEYWORDS_FILE").map_or(defaults.keywords_path, PathBuf::from),
        };

        Ok(Self {
            telegram,
            relay,
            access,
        })
    }
}

/// Parses `OWNER_ID`, falling back to 0 (unset) on garbage.
fn parse_owner_id(raw: &str) -> i64 {
    match raw.parse::<i64>() {
        Ok(id) if id >= 0 => id,
        _ => {
            warn!("Invalid owner ID format: {}", raw);
            0
        }
    }
}

/// Parses the comma-separated `ADMIN_IDS` list, skipping invalid entries.
fn parse_admin_list(raw: &str) -> Vec<i64> {
    let mut ids = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match entry.parse::<i64>() {
            Ok(id) if id > 0 => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            _ => warn!("Invalid admin ID format: {}", entry),
        }
    }
    ids
}

/// Parses the legacy single `ADMIN_ID` variable; "0" means unset.
fn parse_legacy_admin(raw: &str) -> Option<i64> {
    match raw.parse::<i64>() {
        Ok(0) => None,
        Ok(id) if id > 0 => Some(id),
        _ => {
            warn!("Invalid admin ID format: {}", raw);
            None
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<not set>" } else { "<set>" }
}

/// A single problem with one configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// Environment variable name.
    pub field: &'static str,

    /// Human-readable description of the problem.
    pub message: String,
}

impl FieldIssue {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {}", join_issues(.0))]
    Invalid(Vec<FieldIssue>),
}

impl ConfigError {
    /// Returns the individual field issues.
    #[must_use]
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Invalid(issues) => issues,
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
