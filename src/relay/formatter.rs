//! Rendering of forward records into the outbound text.

use chrono::{DateTime, Local};

use super::message::IncomingMessage;
use crate::config::CHANNEL_MARKER;

/// Placeholder value for fields Telegram did not expose.
pub const UNAVAILABLE: &str = "unavailable";

/// Timestamp format used for `{date}`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Template used for every forwarded message.
pub const DEFAULT_TEMPLATE: &str = "
📬 New message containing a keyword:

📝 Message: {message}

👤 Sender: {sender_name}
🔖 Username: {username}
🆔 User ID: {user_id}
🔗 Message link: {message_link}

📅 {date}
";

/// Everything that goes into one forwarded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardRecord {
    /// Message text, verbatim.
    pub message: String,

    /// Trimmed first and last name of the sender.
    pub sender_name: String,

    /// `@handle`, or the unavailable marker.
    pub username: String,

    /// Sender id, 0 when unknown.
    pub user_id: i64,

    /// Deep link to the message, or the unavailable marker.
    pub message_link: String,

    /// Local time the record was built, in [`DATE_FORMAT`].
    pub date: String,
}

impl ForwardRecord {
    /// Builds the record for a matched message, stamped with `now`.
    ///
    /// Missing sender info becomes an empty name, the unavailable marker
    /// and id `0`.
    #[must_use]
    pub fn from_incoming(msg: &IncomingMessage, now: DateTime<Local>) -> Self {
        let (sender_name, username, user_id) = match &msg.sender {
            Some(sender) => (sender.display_name(), sender.handle(), sender.id),
            None => (String::new(), UNAVAILABLE.to_owned(), 0),
        };

        Self {
            message: msg.text.clone(),
            sender_name,
            username,
            user_id,
            message_link: message_link(msg.chat_id, msg.message_id)
                .unwrap_or_else(|| UNAVAILABLE.to_owned()),
            date: now.format(DATE_FORMAT).to_string(),
        }
    }

    fn field(&self, name: &str) -> Option<String> {
        Some(match name {
            "message" => self.message.clone(),
            "sender_name" => self.sender_name.clone(),
            "username" => self.username.clone(),
            "user_id" => self.user_id.to_string(),
            "message_link" => self.message_link.clone(),
            "date" => self.date.clone(),
            _ => return None,
        })
    }
}

/// Deep link to a message, available only for `-100` chats.
#[must_use]
pub fn message_link(chat_id: i64, message_id: i32) -> Option<String> {
    let raw = chat_id.to_string();
    let bare = raw.strip_prefix(CHANNEL_MARKER)?;
    if bare.is_empty() {
        return None;
    }
    Some(format!("https://t.me/c/{bare}/{message_id}"))
}

/// Fills the forward template.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    template: String,
}

impl Default for MessageFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl MessageFormatter {
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitutes the record into the template.
    ///
    /// A single left-to-right pass: inserted values are never re-scanned,
    /// and unknown `{...}` sequences are copied through unchanged.
    #[must_use]
    pub fn format(&self, record: &ForwardRecord) -> String {
        let mut out = String::with_capacity(self.template.len() + record.message.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            match after.find('}') {
                Some(close) => match record.field(&after[..close]) {
                    Some(value) => {
                        out.push_str(&value);
                        rest = &after[close + 1..];
                    }
                    None => {
                        out.push('{');
                        rest = after;
                    }
                },
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}
