//! Relay destination identifier.

use std::fmt;

use thiserror::Error;

/// Prefix that marks a Bot-API style channel/supergroup identifier.
pub const CHANNEL_MARKER: &str = "-100";

/// Negative identifiers with at least this many digits are complete
/// dialog ids and never get the marker.
const FULL_DIALOG_DIGITS: usize = 10;

/// Errors produced while parsing a target channel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelIdError {
    #[error("channel identifier is empty")]
    Empty,

    #[error("channel identifier is not a number: {0}")]
    NotNumeric(String),

    #[error("channel identifier must not be 0")]
    Zero,
}

/// Identifier of the channel that receives relayed messages.
///
/// Short negative identifiers are bare channel ids and get the `-100`
/// marker inserted: `-9876` becomes `-1009876`. Negative identifiers that
/// already start with the marker, or that have ten or more digits, are
/// complete dialog ids and are kept unchanged (`-1234567890`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(i64);

impl ChannelId {
    /// Wraps an already-normalized identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Parses and normalizes the string form of a channel identifier.
    pub fn parse(raw: &str) -> Result<Self, ChannelIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ChannelIdError::Empty);
        }

        let normalized = match raw.strip_prefix('-') {
            Some(rest)
                if !rest.is_empty()
                    && rest.len() < FULL_DIALOG_DIGITS
                    && !raw.starts_with(CHANNEL_MARKER) =>
            {
                format!("{CHANNEL_MARKER}{rest}")
            }
            _ => raw.to_owned(),
        };

        let id: i64 = normalized
            .parse()
            .map_err(|_| ChannelIdError::NotNumeric(raw.to_owned()))?;

        if id == 0 {
            return Err(ChannelIdError::Zero);
        }

        Ok(Self(id))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether the identifier follows the `-100<id>` channel convention.
    #[must_use]
    pub fn is_channel_style(self) -> bool {
        self.0.to_string().starts_with(CHANNEL_MARKER)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_dialog_id_is_kept() {
        let id = ChannelId::parse("-1234567890").unwrap();
        assert_eq!(id.get(), -1_234_567_890);
        assert!(!id.is_channel_style());
    }

    #[test]
    fn test_marked_channel_is_kept() {
        let id = ChannelId::parse("-1001234567890").unwrap();
        assert_eq!(id.get(), -1_001_234_567_890);
        assert!(id.is_channel_style());

        let short = ChannelId::parse("-1005").unwrap();
        assert_eq!(short.get(), -1005);
    }

    #[test]
    fn test_unprefixed_negative_gets_marker() {
        let id = ChannelId::parse("-9876").unwrap();
        assert_eq!(id.get(), -1_009_876);
        assert!(id.is_channel_style());
    }

    #[test]
    fn test_positive_id_untouched() {
        let id = ChannelId::parse(" 42 ").unwrap();
        assert_eq!(id.get(), 42);
        assert!(!id.is_channel_style());
    }

    #[test]
    fn test_invalid_ids() {
        assert_eq!(ChannelId::parse(""), Err(ChannelIdError::Empty));
        assert_eq!(ChannelId::parse("0"), Err(ChannelIdError::Zero));
        assert!(matches!(
            ChannelId::parse("@my_channel"),
            Err(ChannelIdError::NotNumeric(_))
        ));
        assert!(matches!(
            ChannelId::parse("-"),
            Err(ChannelIdError::NotNumeric(_))
        ));
    }
}
