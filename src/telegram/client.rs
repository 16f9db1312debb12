//! Telegram client wrapper shared by the userbot and the official bot.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use grammers_client::client::{LoginToken, PasswordToken, UpdateStream, UpdatesConfiguration};
use grammers_client::peer::Peer;
use grammers_client::{Client, InvocationError, SenderPool, SignInError, sender};
use grammers_session::storages::SqliteSession;
use grammers_session::types::{PeerAuth, PeerId, PeerRef};
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::{PeerInfo, PeerKind, UserSession};
use crate::actions::Target;
use crate::config::CHANNEL_MARKER;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Not authorized. Please sign in first.")]
    NotAuthorized,

    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Password required for 2FA")]
    PasswordRequired(PasswordToken),

    #[error("Invalid password")]
    InvalidPassword(PasswordToken),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),

    #[error("Could not find {0}")]
    NotFound(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let lowered = err_msg.to_lowercase();

    for pattern in ["flood_wait_", "flood wait "] {
        if let Some(idx) = lowered.find(pattern) {
            let num_str: String = lowered[idx + pattern.len()..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// Peers seen by a client, keyed by Bot-API dialog id.
///
/// Gives raw-id sends the access hash of a peer seen earlier.
#[derive(Debug)]
struct KnownPeers<V> {
    peers: Mutex<HashMap<i64, V>>,
}

impl<V> Default for KnownPeers<V> {
    fn default() -> Self {
        Self {
            peers: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone> KnownPeers<V> {
    fn remember(&self, id: i64, peer: V) {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, peer);
    }

    fn get(&self, id: i64) -> Option<V> {
        self.peers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

/// A connected Telegram identity (userbot account or official bot).
pub struct TelegramClient {
    /// Label used in logs ("userbot", "bot").
    label: &'static str,

    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Background task running the sender pool.
    pool_task: JoinHandle<()>,

    /// Peers resolved or listed so far.
    known: KnownPeers<Peer>,
}

impl TelegramClient {
    /// Opens the session file and connects.
    ///
    /// Returns the client together with the stream of updates it receives.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened or the
    /// connection fails.
    pub async fn connect(
        label: &'static str,
        session_path: &Path,
        api_id: i32,
    ) -> Result<(Self, UpdateStream), TelegramError> {
        info!("Connecting {} to Telegram...", label);

        let session = Arc::new(
            SqliteSession::open(session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), api_id);

        let client = Client::new(handle.clone());

        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let stream = client.stream_updates(
            updates,
            UpdatesConfiguration {
                catch_up: false,
                ..Default::default()
            },
        );

        let this = Self {
            label,
            client,
            handle: handle.thin,
            pool_task,
            known: KnownPeers::default(),
        };

        info!(
            "{} connected. Authorized: {}",
            label,
            this.is_authorized().await?
        );

        Ok((this, stream))
    }

    /// Checks if the client is authorized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Signs in as an official bot.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected.
    pub async fn bot_sign_in(&self, token: &str, api_hash: &str) -> Result<(), TelegramError> {
        info!("Signing in {} with bot token...", self.label);

        self.client
            .bot_sign_in(token, api_hash)
            .await
            .map(|_user| ())
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Requests a login code to be sent to the phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn request_login_code(
        &self,
        phone: &str,
        api_hash: &str,
    ) -> Result<LoginToken, TelegramError> {
        info!("Requesting login code for phone: {}...", mask_phone(phone));

        self.client
            .request_login_code(phone, api_hash)
            .await
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Signs in with the login code.
    ///
    /// # Errors
    ///
    /// Returns an error if sign in fails.
    pub async fn sign_in(&self, token: &LoginToken, code: &str) -> Result<(), TelegramError> {
        info!("Signing in with login code...");

        match self.client.sign_in(token, code).await {
            Ok(_user) => Ok(()),
            Err(SignInError::PasswordRequired(password_token)) => {
                debug!("2FA password required, hint: {:?}", password_token.hint());
                Err(TelegramError::PasswordRequired(password_token))
            }
            Err(SignInError::InvalidCode) => {
                Err(TelegramError::SignInFailed("Invalid code".to_owned()))
            }
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Checks the 2FA password.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is invalid.
    pub async fn check_password(
        &self,
        password_token: PasswordToken,
        password: &str,
    ) -> Result<(), TelegramError> {
        info!("Checking 2FA password...");

        match self.client.check_password(password_token, password).await {
            Ok(_user) => Ok(()),
            Err(SignInError::InvalidPassword(token)) => Err(TelegramError::InvalidPassword(token)),
            Err(e) => Err(TelegramError::SignInFailed(e.to_string())),
        }
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting {} from Telegram...", self.label);
        self.handle.quit();
    }

    /// Disconnects and waits for the sender pool to stop.
    pub async fn shutdown(self) {
        self.disconnect();
        if let Err(e) = self.pool_task.await {
            warn!("{} sender pool ended abnormally: {}", self.label, e);
        }
    }

    fn peer_ref(peer: &Peer) -> Result<PeerRef, TelegramError> {
        peer.to_ref()
            .ok_or_else(|| TelegramError::NotFound(format!("access hash for {}", peer.id())))
    }

    fn remember(&self, peer: &Peer) {
        self.known.remember(peer.id().bot_api_dialog_id(), peer.clone());
    }

    async fn find_in_dialogs(&self, dialog_id: i64) -> Result<Option<Peer>, TelegramError> {
        debug!("Scanning dialogs for {}", dialog_id);
        let mut dialogs = self.client.iter_dialogs();
        while let Some(dialog) = dialogs.next().await? {
            let peer = dialog.peer();
            self.remember(peer);
            if peer.id().bot_api_dialog_id() == dialog_id {
                return Ok(Some(peer.clone()));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl UserSession for TelegramClient {
    type Peer = Peer;

    fn peer_info(peer: &Peer) -> PeerInfo {
        let id = peer.id().bot_api_dialog_id();
        let username = peer.username().map(str::to_owned);

        match peer {
            Peer::User(user) => PeerInfo {
                id,
                kind: PeerKind::User,
                name: user.first_name().unwrap_or_default().to_owned(),
                last_name: user.last_name().map(str::to_owned),
                username,
            },
            Peer::Group(_) => PeerInfo {
                id,
                kind: PeerKind::Group,
                name: peer.name().unwrap_or_default().to_owned(),
                last_name: None,
                username,
            },
            Peer::Channel(_) => PeerInfo {
                id,
                kind: PeerKind::Channel,
                name: peer.name().unwrap_or_default().to_owned(),
                last_name: None,
                username,
            },
        }
    }

    async fn me(&self) -> Result<PeerInfo, TelegramError> {
        let me = self.client.get_me().await?;
        Ok(Self::peer_info(&Peer::User(me)))
    }

    async fn resolve(&self, target: &Target) -> Result<Peer, TelegramError> {
        let found = match target {
            Target::Handle(handle) => {
                let found = self.client.resolve_username(handle).await?;
                if let Some(peer) = &found {
                    self.remember(peer);
                }
                found
            }
            Target::NumericId(id) => self.find_in_dialogs(*id).await?,
        };

        found.ok_or_else(|| TelegramError::NotFound(target.to_string()))
    }

    async fn send_text(&self, peer: &Peer, text: &str) -> Result<(), TelegramError> {
        let peer = Self::peer_ref(peer)?;
        self.client.send_message(peer, text).await?;
        Ok(())
    }

    async fn send_to_id(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let peer = match self.known.get(chat_id).and_then(|peer| peer.to_ref()) {
            Some(peer) => peer,
            None => PeerRef {
                id: peer_id_from_dialog(chat_id),
                auth: PeerAuth::default(),
            },
        };
        self.client.send_message(peer, text).await?;
        Ok(())
    }

    async fn group_dialogs(&self) -> Result<Vec<Peer>, TelegramError> {
        let mut groups = Vec::new();
        let mut dialogs = self.client.iter_dialogs();

        while let Some(dialog) = dialogs.next().await? {
            let peer = dialog.peer();
            self.remember(peer);
            match peer {
                Peer::Group(_) | Peer::Channel(_) => groups.push(peer.clone()),
                Peer::User(_) => {}
            }
        }

        debug!("Found {} group dialogs", groups.len());
        Ok(groups)
    }

    async fn join_invite(&self, hash: &str) -> Result<(), TelegramError> {
        let request = tl::functions::messages::ImportChatInvite {
            hash: hash.to_owned(),
        };
        self.client.invoke(&request).await?;
        Ok(())
    }

    async fn join(&self, peer: &Peer) -> Result<(), TelegramError> {
        let peer_ref = Self::peer_ref(peer)?;
        self.client.join_chat(peer_ref).await?;
        Ok(())
    }

    async fn leave(&self, peer: &Peer) -> Result<(), TelegramError> {
        let peer_ref = Self::peer_ref(peer)?;
        if let Err(e) = self.client.delete_dialog(peer_ref).await {
            warn!("Failed to leave {}: {}", peer.id(), e);
            return Err(e.into());
        }
        Ok(())
    }
}

/// Maps a Bot-API style dialog id back to a typed peer id.
fn peer_id_from_dialog(dialog_id: i64) -> PeerId {
    let raw = dialog_id.to_string();

    if let Some(bare) = raw.strip_prefix(CHANNEL_MARKER)
        && let Ok(bare) = bare.parse()
    {
        PeerId::channel(bare)
    } else if dialog_id < 0 {
        PeerId::chat(-dialog_id)
    } else {
        PeerId::user(dialog_id)
    }
}

/// Masks a phone number for logging (shows last 4 digits).
fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() > 4 {
        format!("***{}", &digits[digits.len() - 4..])
    } else {
        "****".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+1234567890"), "***7890");
        assert_eq!(mask_phone("123"), "****");
        assert_eq!(mask_phone("+7 (999) 123-45-67"), "***4567");
    }

    #[test]
    fn test_extract_flood_wait() {
        assert_eq!(extract_flood_wait_seconds("FLOOD_WAIT_120"), Some(120));
        assert_eq!(extract_flood_wait_seconds("flood wait 60 seconds"), Some(60));
        assert_eq!(extract_flood_wait_seconds("some other error"), None);
    }

    #[test]
    fn test_known_peers() {
        let known = KnownPeers::default();
        assert_eq!(known.get(-1_001_234_567_890), None);

        known.remember(-1_001_234_567_890, "relay");
        known.remember(777, "friend");
        known.remember(-1_001_234_567_890, "relay (renamed)");

        assert_eq!(known.get(-1_001_234_567_890), Some("relay (renamed)"));
        assert_eq!(known.get(777), Some("friend"));
        assert_eq!(known.get(-4321), None);
    }

    #[test]
    fn test_peer_id_from_dialog() {
        assert_eq!(peer_id_from_dialog(-1_001_234_567_890), PeerId::channel(1_234_567_890));
        assert_eq!(peer_id_from_dialog(-4321), PeerId::chat(4321));
        assert_eq!(peer_id_from_dialog(777), PeerId::user(777));
    }
}
