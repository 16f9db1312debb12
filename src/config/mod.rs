//! Configuration module for the relay bot.
//!
//! Handles loading and validation of the environment-sourced settings:
//! Telegram credentials, the relay target channel, and the initial
//! authorization data.

mod channel;
mod settings;

pub use channel::{CHANNEL_MARKER, ChannelId, ChannelIdError};
pub use settings::{
    AccessSettings, ConfigError, FieldIssue, RelaySettings, Settings, TelegramConfig,
};
