//! Messages observed by the userbot, detached from the transport.

use chrono::{DateTime, Utc};

use super::formatter::UNAVAILABLE;

/// Author of an observed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderInfo {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Username without `@`.
    pub username: Option<String>,
}

impl SenderInfo {
    /// First and last name joined and trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name,
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_owned()
    }

    /// `@username`, or the unavailable marker.
    #[must_use]
    pub fn handle(&self) -> String {
        match self.username.as_deref() {
            Some(name) if !name.is_empty() => format!("@{name}"),
            _ => UNAVAILABLE.to_owned(),
        }
    }
}

/// A new incoming message from any chat the userbot can see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Bot-API style chat id.
    pub chat_id: i64,

    /// Whether the chat is a one-to-one conversation.
    pub is_private: bool,

    /// Author, when Telegram exposes one (anonymous channel posts have none).
    pub sender: Option<SenderInfo>,

    pub text: String,

    pub message_id: i32,

    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(first: &str, last: Option<&str>, username: Option<&str>) -> SenderInfo {
        SenderInfo {
            id: 1,
            first_name: first.to_owned(),
            last_name: last.map(str::to_owned),
            username: username.map(str::to_owned),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(sender("Ali", Some("Hassan"), None).display_name(), "Ali Hassan");
        assert_eq!(sender("Ali", None, None).display_name(), "Ali");
        assert_eq!(sender("", Some("Hassan"), None).display_name(), "Hassan");
    }

    #[test]
    fn test_handle() {
        assert_eq!(sender("Ali", None, Some("ali")).handle(), "@ali");
        assert_eq!(sender("Ali", None, None).handle(), UNAVAILABLE);
        assert_eq!(sender("Ali", None, Some("")).handle(), UNAVAILABLE);
    }
}
