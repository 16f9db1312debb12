//! Telegram client wrapper module.
//!
//! Provides the connected userbot and bot identities, the session seam
//! used by the relay and the actions, and update conversion.

mod client;
mod session;
mod updates;

pub use client::{TelegramClient, TelegramError};
pub use grammers_client::client::{LoginToken, PasswordToken, UpdateStream};
pub use grammers_client::update::Update;
pub use session::{PeerInfo, PeerKind, UserSession};
pub use updates::{BotRequest, MessageReply, bot_request, dialog_id, incoming_message};

#[cfg(test)]
pub(crate) use session::fake;
