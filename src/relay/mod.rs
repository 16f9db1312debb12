//! Keyword relay module.
//!
//! Matches messages the userbot observes against the keyword set and
//! forwards hits to the target channel.

mod delivery;
mod engine;
mod formatter;
mod matcher;
mod message;

pub use delivery::{DeliveryError, DeliveryRoute, TargetChannel, deliver, first_success};
pub use engine::{IgnoreReason, RelayEngine, RelayOutcome, RelayStats};
pub use formatter::{
    DATE_FORMAT, DEFAULT_TEMPLATE, ForwardRecord, MessageFormatter, UNAVAILABLE, message_link,
};
pub use matcher::{KeywordMatcher, compile_keyword, find_match, has_word_edges};
pub use message::{IncomingMessage, SenderInfo};
