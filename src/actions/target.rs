//! Parsing of user-supplied chat and user references.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// A chat or user reference as typed by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Numeric id (`123456`, `-1001234567890`).
    NumericId(i64),

    /// Public username, stored without the leading `@`.
    Handle(String),
}

impl Target {
    /// Parses a reference: `-?digits` is numeric, anything else is a handle.
    ///
    /// Returns `None` for empty input or an out-of-range number.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let digits = raw.strip_prefix('-').unwrap_or(raw);

        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return raw.parse().ok().map(Self::NumericId);
        }

        let handle = raw.strip_prefix('@').unwrap_or(raw);
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return None;
        }

        Some(Self::Handle(handle.to_owned()))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumericId(id) => write!(f, "{id}"),
            Self::Handle(handle) => write!(f, "@{handle}"),
        }
    }
}

static INVITE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"t\.me/(?:\+|joinchat/)([A-Za-z0-9_-]+)").unwrap()
});

static PUBLIC_LINK: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"t\.me/([A-Za-z0-9_]+)").unwrap()
});

static BARE_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^@?([A-Za-z0-9_]+)$").unwrap()
});

/// What a `/join` argument points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinLink {
    /// Private invite (`t.me/+HASH`, `t.me/joinchat/HASH`).
    InviteHash(String),

    /// Public group or channel username.
    Username(String),
}

impl JoinLink {
    /// Parses an invite link, a public `t.me` link or a bare username.
    #[must_use]
    pub fn parse(link: &str) -> Option<Self> {
        let link = link.trim();

        if let Some(caps) = INVITE_LINK.captures(link) {
            return Some(Self::InviteHash(caps[1].to_owned()));
        }
        if let Some(caps) = PUBLIC_LINK.captures(link) {
            return Some(Self::Username(caps[1].to_owned()));
        }
        if ["https:", "http:", "t.me"]
            .iter()
            .any(|prefix| link.starts_with(prefix))
        {
            return None;
        }

        BARE_USERNAME
            .captures(link)
            .map(|caps| Self::Username(caps[1].to_owned()))
    }
}
