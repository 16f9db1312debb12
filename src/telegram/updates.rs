//! Conversion of raw Telegram updates into relay and command inputs.

use chrono::{DateTime, Utc};
use grammers_client::update::Message;
use grammers_tl_types as tl;

use super::client::TelegramClient;
use super::session::{PeerKind, UserSession};
use super::TelegramError;
use crate::commands::ReplySink;
use crate::relay::{IncomingMessage, SenderInfo};

/// Offset between a bare channel id and its Bot-API dialog id.
const CHANNEL_OFFSET: i64 = 1_000_000_000_000;

/// Bot-API style dialog id of a raw peer.
#[must_use]
pub fn dialog_id(peer: &tl::enums::Peer) -> i64 {
    match peer {
        tl::enums::Peer::User(user) => user.user_id,
        tl::enums::Peer::Chat(chat) => -chat.chat_id,
        tl::enums::Peer::Channel(channel) => -(CHANNEL_OFFSET + channel.channel_id),
    }
}

fn plain_message(message: &Message) -> Option<&tl::types::Message> {
    match &message.raw {
        tl::enums::Message::Message(raw) if !raw.out => Some(raw),
        _ => None,
    }
}

/// Converts a message seen by the userbot.
///
/// Outgoing and service messages yield `None`.
#[must_use]
pub fn incoming_message(message: &Message) -> Option<IncomingMessage> {
    let raw = plain_message(message)?;

    let sender = message.sender().and_then(|peer| {
        let info = TelegramClient::peer_info(&peer);
        (info.kind == PeerKind::User).then(|| SenderInfo {
            id: info.id,
            first_name: info.name,
            last_name: info.last_name,
            username: info.username,
        })
    });

    Some(IncomingMessage {
        chat_id: dialog_id(&raw.peer_id),
        is_private: matches!(raw.peer_id, tl::enums::Peer::User(_)),
        sender,
        text: raw.message.clone(),
        message_id: raw.id,
        sent_at: DateTime::from_timestamp(i64::from(raw.date), 0).unwrap_or_else(Utc::now),
    })
}

/// A private message sent to the official bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotRequest {
    pub caller_id: i64,
    pub text: String,
}

/// Extracts the caller and text of a private message to the bot.
///
/// Group messages, outgoing messages and empty texts yield `None`.
#[must_use]
pub fn bot_request(message: &Message) -> Option<BotRequest> {
    let raw = plain_message(message)?;

    let tl::enums::Peer::User(chat) = &raw.peer_id else {
        return None;
    };
    if raw.message.trim().is_empty() {
        return None;
    }

    let caller_id = raw.from_id.as_ref().map_or(chat.user_id, dialog_id);
    Some(BotRequest {
        caller_id,
        text: raw.message.clone(),
    })
}

/// Replies to the message a request came from.
#[derive(Debug)]
pub struct MessageReply<'a>(pub &'a Message);

impl ReplySink for MessageReply<'_> {
    async fn reply(&self, text: &str) -> Result<(), TelegramError> {
        self.0.reply(text).await?;
        Ok(())
    }
}
