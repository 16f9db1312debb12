//! Account-level operations the relay and the actions need from the
//! userbot session.

use std::future::Future;

use super::TelegramError;
use crate::actions::Target;

/// Kind of a resolved peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerKind {
    User,
    Group,
    Channel,
}

/// Profile fields of a resolved peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Bot-API style id (`-100...` for channels and supergroups).
    pub id: i64,

    pub kind: PeerKind,

    /// First name for users, title for groups and channels.
    pub name: String,

    /// Last name, users only.
    pub last_name: Option<String>,

    /// Public username without `@`.
    pub username: Option<String>,
}

impl PeerInfo {
    /// First and last name joined, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name.as_deref().unwrap_or(""))
            .trim()
            .to_owned()
    }

    /// Whether this peer is a group or channel.
    #[must_use]
    pub fn is_chat(&self) -> bool {
        matches!(self.kind, PeerKind::Group | PeerKind::Channel)
    }
}

/// The live userbot session.
///
/// Implemented over grammers for production and by in-memory fakes in
/// tests. Every call may fail with a transport error; callers convert
/// those into reports instead of propagating them.
pub trait UserSession {
    /// Handle to a resolved peer.
    type Peer: Clone + Send + Sync;

    /// Profile fields of a peer handle.
    fn peer_info(peer: &Self::Peer) -> PeerInfo;

    /// The logged-in account.
    fn me(&self) -> impl Future<Output = Result<PeerInfo, TelegramError>> + Send;

    /// Resolves a numeric id or a username to a peer.
    fn resolve(
        &self,
        target: &Target,
    ) -> impl Future<Output = Result<Self::Peer, TelegramError>> + Send;

    /// Sends a text message to a resolved peer.
    fn send_text(
        &self,
        peer: &Self::Peer,
        text: &str,
    ) -> impl Future<Output = Result<(), TelegramError>> + Send;

    /// Sends a text message to a raw chat id, skipping resolution.
    fn send_to_id(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), TelegramError>> + Send;

    /// Every group and channel the account is a member of.
    fn group_dialogs(&self) -> impl Future<Output = Result<Vec<Self::Peer>, TelegramError>> + Send;

    /// Joins through a private invite hash.
    fn join_invite(&self, hash: &str) -> impl Future<Output = Result<(), TelegramError>> + Send;

    /// Joins a public group or channel.
    fn join(&self, peer: &Self::Peer) -> impl Future<Output = Result<(), TelegramError>> + Send;

    /// Leaves a group or channel.
    fn leave(&self, peer: &Self::Peer) -> impl Future<Output = Result<(), TelegramError>> + Send;
}
