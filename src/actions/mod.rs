//! Account actions run through the userbot session on an admin's behalf.

mod executor;
mod pacer;
mod target;

pub use executor::{AccountActions, ActionError, BroadcastReport};
pub use pacer::SendPacer;
pub use target::{JoinLink, Target};
