//! Account actions the admins can run through the userbot session.
//!
//! Every operation returns the text to reply with. Failures are caught at
//! the operation boundary and reported, never propagated.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::pacer::SendPacer;
use super::target::{JoinLink, Target};
use crate::relay::UNAVAILABLE;
use crate::telegram::{PeerInfo, PeerKind, TelegramError, UserSession};

/// Why an account action failed.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Could not find {0}")]
    NotFound(String),

    #[error("This is not a {0}.")]
    WrongKind(&'static str),

    #[error("Invalid link format. Please use a t.me link or a username.")]
    InvalidLink,

    #[error(transparent)]
    Transport(TelegramError),
}

impl From<TelegramError> for ActionError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::NotFound(what) => Self::NotFound(what),
            other => Self::Transport(other),
        }
    }
}

impl ActionError {
    /// Reply text for a failed operation.
    fn reply(&self, doing: &str) -> String {
        match self {
            Self::WrongKind(_) | Self::InvalidLink => format!("❌ {self}"),
            Self::NotFound(_) | Self::Transport(_) => format!("❌ Error {doing}: {self}"),
        }
    }
}

/// Outcome counts of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

/// Runs admin-requested actions against the userbot session.
#[derive(Debug)]
pub struct AccountActions<S> {
    session: Arc<S>,
    pacer: SendPacer,
}

impl<S: UserSession> AccountActions<S> {
    #[must_use]
    pub fn new(session: Arc<S>, pacer: SendPacer) -> Self {
        Self { session, pacer }
    }

    /// Reports which account the userbot is logged in as.
    pub async fn status(&self) -> String {
        match self.session.me().await {
            Ok(me) => format!(
                "✅ UserBot is running!\nConnected as: {} ({}) - ID: {}",
                me.name,
                me.username
                    .map_or_else(|| "No username".to_owned(), |u| format!("@{u}")),
                me.id
            ),
            Err(e) => ActionError::from(e).reply("checking UserBot status"),
        }
    }

    /// Sends `text` to a user or chat.
    pub async fn send(&self, target: &Target, text: &str) -> String {
        match self.try_send(target, text).await {
            Ok(()) => {
                info!("Sent message to {}", target);
                format!("✅ Message sent successfully to {target}")
            }
            Err(e) => e.reply("sending message"),
        }
    }

    async fn try_send(&self, target: &Target, text: &str) -> Result<(), ActionError> {
        let peer = self.session.resolve(target).await?;
        self.session.send_text(&peer, text).await?;
        Ok(())
    }

    /// Sends `text` to every group and channel the account is in.
    pub async fn broadcast(&self, text: &str) -> String {
        match self.broadcast_report(text).await {
            Ok(report) => format!(
                "✅ Broadcast complete: Sent to {} groups/channels, failed in {} groups/channels.",
                report.sent, report.failed
            ),
            Err(e) => e.reply("during broadcast"),
        }
    }

    async fn broadcast_report(&self, text: &str) -> Result<BroadcastReport, ActionError> {
        let groups = self.session.group_dialogs().await?;
        let mut report = BroadcastReport::default();

        for peer in &groups {
            self.pacer.wait_and_acquire().await;

            match self.session.send_text(peer, text).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    warn!("Broadcast to {} failed: {}", S::peer_info(peer).id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Broadcast finished: {} sent, {} failed",
            report.sent, report.failed
        );
        Ok(report)
    }

    /// Joins a group or channel from an invite link, public link or username.
    pub async fn join(&self, link: &str) -> String {
        self.try_join(link)
            .await
            .unwrap_or_else(|e| e.reply("joining group"))
    }

    async fn try_join(&self, link: &str) -> Result<String, ActionError> {
        match JoinLink::parse(link).ok_or(ActionError::InvalidLink)? {
            JoinLink::InviteHash(hash) => {
                self.session.join_invite(&hash).await?;
                Ok("✅ Successfully joined the group via invite link.".to_owned())
            }
            JoinLink::Username(name) => {
                let peer = self.session.resolve(&Target::Handle(name.clone())).await?;
                if !S::peer_info(&peer).is_chat() {
                    return Err(ActionError::WrongKind("group or channel"));
                }
                self.session.join(&peer).await?;
                Ok(format!("✅ Successfully joined {name}."))
            }
        }
    }

    /// Leaves a group or channel.
    pub async fn leave(&self, target: &Target) -> String {
        match self.try_leave(target).await {
            Ok(id) => format!("✅ Successfully left the chat with ID {id}"),
            Err(e) => e.reply("leaving chat"),
        }
    }

    async fn try_leave(&self, target: &Target) -> Result<i64, ActionError> {
        let peer = self.session.resolve(target).await?;
        let info = S::peer_info(&peer);
        if !info.is_chat() {
            return Err(ActionError::WrongKind("group or channel"));
        }
        self.session.leave(&peer).await?;
        Ok(info.id)
    }

    /// Reads back a user's public profile fields.
    pub async fn lookup(&self, target: &Target) -> String {
        match self.try_lookup(target).await {
            Ok(user) => format!(
                "👤 User Information:\nName: {}\nUsername: {}\nUser ID: {}",
                user.full_name(),
                user.username
                    .map_or_else(|| UNAVAILABLE.to_owned(), |u| format!("@{u}")),
                user.id
            ),
            Err(e) => e.reply("getting user info"),
        }
    }

    async fn try_lookup(&self, target: &Target) -> Result<PeerInfo, ActionError> {
        let peer = self.session.resolve(target).await?;
        let info = S::peer_info(&peer);
        if info.kind != PeerKind::User {
            return Err(ActionError::WrongKind("user"));
        }
        Ok(info)
    }
}
