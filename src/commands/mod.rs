//! Command handling module.
//!
//! Parses and authorizes the admin commands sent to the official bot and
//! runs them against the store or the userbot session.

mod handler;
mod types;

pub use handler::{CommandHandler, NOT_ADMIN, OWNER_ONLY, ReplySink, START_REJECTION};
pub use types::{AdminCommand, CommandKind, CommandResult, UsageError, split_command};
