//! Command handler implementation.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::types::{AdminCommand, CommandKind, CommandResult, split_command};
use crate::actions::AccountActions;
use crate::auth::{AuthError, AuthorizationStore, Permission, StoreError, UNCONFIGURED_ADMIN, authorize};
use crate::telegram::{TelegramError, UserSession};

/// Reply to a non-admin sending `/start`.
pub const START_REJECTION: &str = "⛔ This bot is for administrators only. You cannot use it.";

/// Reply to a non-admin sending any other command.
pub const NOT_ADMIN: &str = "⛔ You are not an admin. This command is available to admins only.";

/// Reply to an admin sending an owner-only command.
pub const OWNER_ONLY: &str = "⛔ This command is available to the bot owner only.";

/// Where replies to the current request go.
pub trait ReplySink {
    fn reply(&self, text: &str) -> impl Future<Output = Result<(), TelegramError>> + Send;
}

/// Authorizes and runs commands sent to the official bot.
#[derive(Debug)]
pub struct CommandHandler<S> {
    store: Arc<RwLock<AuthorizationStore>>,
    actions: AccountActions<S>,
}

impl<S: UserSession> CommandHandler<S> {
    #[must_use]
    pub fn new(store: Arc<RwLock<AuthorizationStore>>, actions: AccountActions<S>) -> Self {
        Self { store, actions }
    }

    /// Handles one message from `caller`, replying through `sink`.
    pub async fn handle<R: ReplySink>(&self, caller: i64, text: &str, sink: &R) {
        let Some((word, args)) = split_command(text) else {
            if self.store.read().await.require_admin(caller) {
                send(
                    sink,
                    &format!("Message received: {text}\nUse /help to see the list of commands."),
                )
                .await;
            }
            return;
        };

        let Some(kind) = CommandKind::from_name(word) else {
            let reply = if self.store.read().await.require_admin(caller) {
                format!("❓ Unknown command /{word}. Use /help to see the list of commands.")
            } else {
                NOT_ADMIN.to_owned()
            };
            send(sink, &reply).await;
            return;
        };

        debug!("Command {} from {}", kind, caller);

        let access = {
            let mut store = self.store.write().await;
            authorize(&mut store, caller, kind.permission())
        };
        let access = match access {
            Ok(access) => access,
            Err(err) => {
                send(sink, &rejection(kind, &err)).await;
                return;
            }
        };

        if let Some(notice) = access.notice(caller) {
            send(sink, &notice).await;
        }

        let command = match AdminCommand::parse(kind, args) {
            Ok(command) => command,
            Err(usage) => {
                send(sink, &usage.to_string()).await;
                return;
            }
        };

        if let Some(note) = command.progress_note() {
            send(sink, &note).await;
        }

        let result = self.execute(command).await;
        info!("Command {} from {}: success={}", kind, caller, result.success);
        send(sink, &result.message).await;
    }

    async fn execute(&self, command: AdminCommand) -> CommandResult {
        match command {
            AdminCommand::Start => self.handle_start().await,
            AdminCommand::Help => handle_help(),
            AdminCommand::Status => CommandResult::success(self.actions.status().await),
            AdminCommand::Send { target, text } => {
                CommandResult::success(self.actions.send(&target, &text).await)
            }
            AdminCommand::Broadcast { text } => {
                CommandResult::success(self.actions.broadcast(&text).await)
            }
            AdminCommand::Join { link } => CommandResult::success(self.actions.join(&link).await),
            AdminCommand::Leave { target } => {
                CommandResult::success(self.actions.leave(&target).await)
            }
            AdminCommand::Info { target } => {
                CommandResult::success(self.actions.lookup(&target).await)
            }
            AdminCommand::AddKeyword(keyword) => self.handle_add_keyword(&keyword).await,
            AdminCommand::ListKeywords => self.handle_list_keywords().await,
            AdminCommand::DeleteKeyword(keyword) => self.handle_delete_keyword(&keyword).await,
            AdminCommand::Admins => self.handle_admin_panel().await,
            AdminCommand::AddAdmin(id) => self.handle_add_admin(id).await,
            AdminCommand::RemoveAdmin(id) => self.handle_remove_admin(id).await,
            AdminCommand::ListAdmins => self.handle_list_admins().await,
        }
    }

    async fn handle_start(&self) -> CommandResult {
        let mut message = "👋 Welcome to the account control bot!\n\n\
                           Use /help to see the available commands."
            .to_owned();

        if !self.store.read().await.is_owner_configured() {
            message.push_str(
                "\n\nℹ️ No owner is set yet. The first admin to run /admins, \
                 /addadmin or /removeadmin becomes the owner.",
            );
        }

        CommandResult::success(message)
    }

    async fn handle_add_keyword(&self, keyword: &str) -> CommandResult {
        match self.store.write().await.add_keyword(keyword) {
            Ok(()) => CommandResult::success(format!("✅ Keyword '{keyword}' was added.")),
            Err(e) => store_failure(&e),
        }
    }

    async fn handle_list_keywords(&self) -> CommandResult {
        let store = self.store.read().await;

        if store.keywords().is_empty() {
            return CommandResult::success("⚠️ No keywords are configured.");
        }

        let mut lines = vec!["🔑 Current keywords:".to_owned(), String::new()];
        lines.extend(
            store
                .keywords()
                .iter()
                .enumerate()
                .map(|(i, keyword)| format!("{}. {keyword}", i + 1)),
        );
        CommandResult::success(lines.join("\n"))
    }

    async fn handle_delete_keyword(&self, keyword: &str) -> CommandResult {
        match self.store.write().await.remove_keyword(keyword) {
            Ok(()) => CommandResult::success(format!("✅ Keyword '{keyword}' was deleted.")),
            Err(e) => store_failure(&e),
        }
    }

    async fn handle_admin_panel(&self) -> CommandResult {
        let owner = self.store.read().await.owner();
        CommandResult::success(format!(
            "👥 Admin management\n\n\
             Current owner ID: {owner}\n\n\
             Add an admin: {}\n\
             Remove an admin: {}\n\
             List admins: {}",
            CommandKind::AddAdmin.usage(),
            CommandKind::RemoveAdmin.usage(),
            CommandKind::ListAdmins.usage(),
        ))
    }

    async fn handle_add_admin(&self, id: i64) -> CommandResult {
        match self.store.write().await.add_admin(id) {
            Ok(()) => CommandResult::success(format!("✅ User {id} was added as an admin.")),
            Err(e) => store_failure(&e),
        }
    }

    async fn handle_remove_admin(&self, id: i64) -> CommandResult {
        match self.store.write().await.remove_admin(id) {
            Ok(()) => {
                CommandResult::success(format!("✅ User {id} was removed from the admins."))
            }
            Err(e) => store_failure(&e),
        }
    }

    async fn handle_list_admins(&self) -> CommandResult {
        let store = self.store.read().await;
        let owner = store.owner();
        let admins: Vec<i64> = store
            .admins()
            .iter()
            .copied()
            .filter(|&id| id != UNCONFIGURED_ADMIN)
            .collect();

        if admins.is_empty() {
            return CommandResult::success("⚠️ There are no admins yet.");
        }

        let mut lines = vec!["👥 Current admins:".to_owned(), String::new()];
        lines.extend(admins.iter().enumerate().map(|(i, &id)| {
            let mark = if store.is_owner(id) { "👑 " } else { "" };
            format!("{}. {mark}{id}", i + 1)
        }));
        lines.push(String::new());
        lines.push(if store.is_owner_configured() {
            format!("👑 Bot owner: {owner}")
        } else {
            "👑 Bot owner: not set".to_owned()
        });

        CommandResult::success(lines.join("\n"))
    }
}

fn handle_help() -> CommandResult {
    let line = |kind: CommandKind| format!("{} - {}", kind.usage(), kind.description());

    let mut lines = vec!["📋 Available commands:".to_owned(), String::new()];
    lines.extend(
        [
            CommandKind::Status,
            CommandKind::Send,
            CommandKind::Broadcast,
            CommandKind::Join,
            CommandKind::Leave,
            CommandKind::Info,
        ]
        .map(line),
    );
    lines.push(String::new());
    lines.push("🔑 Keyword management:".to_owned());
    lines.extend(
        [
            CommandKind::AddKeyword,
            CommandKind::ListKeywords,
            CommandKind::DeleteKeyword,
        ]
        .map(line),
    );
    lines.push(String::new());
    lines.push("👥 Admin management (owner only):".to_owned());
    lines.extend(
        CommandKind::ALL
            .into_iter()
            .filter(|kind| kind.permission() == Permission::Owner)
            .chain([CommandKind::ListAdmins])
            .map(line),
    );
    lines.push(String::new());
    lines.push(
        "🔍 The bot watches for keywords in every group and forwards matching messages."
            .to_owned(),
    );

    CommandResult::success(lines.join("\n"))
}

/// Reply for a caller the gate turned away.
fn rejection(kind: CommandKind, err: &AuthError) -> String {
    match err {
        AuthError::NotAdmin if kind == CommandKind::Start => START_REJECTION.to_owned(),
        AuthError::NotAdmin => NOT_ADMIN.to_owned(),
        AuthError::NotOwner | AuthError::OwnerAlreadyClaimed => OWNER_ONLY.to_owned(),
        AuthError::Store(e) => format!("❌ Could not record the new owner: {e}"),
    }
}

fn store_failure(err: &StoreError) -> CommandResult {
    match err {
        StoreError::Persist(e) => {
            warn!("Failed to persist store change: {}", e);
            CommandResult::error(format!("❌ Failed to save the change: {e}"))
        }
        StoreError::InvalidAdminId(_) | StoreError::InvalidKeyword(_) => {
            CommandResult::error(format!("❌ {err}."))
        }
        _ => CommandResult::error(format!("⚠️ {err}.")),
    }
}

async fn send<R: ReplySink>(sink: &R, text: &str) {
    if let Err(e) = sink.reply(text).await {
        warn!("Failed to send reply: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use tempfile::{TempDir, tempdir};

    use super::*;
    use crate::actions::SendPacer;
    use crate::auth::ListFile;
    use crate::telegram::PeerKind;
    use crate::telegram::fake::FakeSession;

    const OWNER: i64 = 10;
    const ADMIN: i64 = 20;
    const STRANGER: i64 = 99;

    #[derive(Default)]
    struct RecordingSink {
        replies: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn replies(&self) -> Vec<String> {
            self.replies.lock().unwrap().clone()
        }
    }

    impl ReplySink for RecordingSink {
        async fn reply(&self, text: &str) -> Result<(), TelegramError> {
            self.replies.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    fn handler(dir: &TempDir, owner: i64, admins: Vec<i64>) -> CommandHandler<FakeSession> {
        let store = AuthorizationStore::from_parts(
            owner,
            admins,
            vec!["urgent".to_owned()],
            ListFile::new(dir.path().join("admins.json")),
            ListFile::new(dir.path().join("keywords.json")),
        );
        let session = FakeSession {
            me: Some(FakeSession::user(1, "Relay", None)),
            peers: vec![
                FakeSession::user(30, "Bob", Some("bob")),
                FakeSession::chat(-1_000_000_000_001, PeerKind::Group, "One"),
                FakeSession::chat(-1_000_000_000_002, PeerKind::Group, "Two"),
            ],
            ..FakeSession::default()
        };
        CommandHandler::new(
            Arc::new(RwLock::new(store)),
            AccountActions::new(Arc::new(session), SendPacer::new(Duration::ZERO)),
        )
    }

    async fn run(handler: &CommandHandler<FakeSession>, caller: i64, text: &str) -> Vec<String> {
        let sink = RecordingSink::default();
        handler.handle(caller, text, &sink).await;
        sink.replies()
    }

    #[tokio::test]
    async fn test_non_admin_rejections() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        assert_eq!(run(&handler, STRANGER, "/start").await, vec![START_REJECTION]);
        assert_eq!(run(&handler, STRANGER, "/status").await, vec![NOT_ADMIN]);
        assert_eq!(run(&handler, STRANGER, "/bogus").await, vec![NOT_ADMIN]);
        assert!(run(&handler, STRANGER, "hello").await.is_empty());
    }

    #[tokio::test]
    async fn test_addadmin_by_non_owner_is_rejected() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        assert_eq!(run(&handler, ADMIN, "/addadmin 55").await, vec![OWNER_ONLY]);
        assert_eq!(handler.store.read().await.admins(), &[OWNER, ADMIN]);

        assert_eq!(
            run(&handler, STRANGER, "/addadmin 55").await,
            vec![NOT_ADMIN]
        );
        assert_eq!(handler.store.read().await.admins(), &[OWNER, ADMIN]);
    }

    #[tokio::test]
    async fn test_owner_manages_admins() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        assert_eq!(
            run(&handler, OWNER, "/addadmin 55").await,
            vec!["✅ User 55 was added as an admin."]
        );
        assert_eq!(
            run(&handler, OWNER, "/addadmin 55").await,
            vec!["⚠️ User 55 is already an admin."]
        );
        assert_eq!(
            run(&handler, OWNER, "/removeadmin 10").await,
            vec!["⚠️ The bot owner cannot be removed from the admin list."]
        );
        assert_eq!(
            run(&handler, OWNER, "/removeadmin 55").await,
            vec!["✅ User 55 was removed from the admins."]
        );
        assert_eq!(
            run(&handler, OWNER, "/removeadmin x").await,
            vec!["❌ The user ID must be an integer."]
        );
        assert_eq!(handler.store.read().await.admins(), &[OWNER, ADMIN]);
    }

    #[tokio::test]
    async fn test_first_owner_command_claims() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, 0, vec![ADMIN]);

        let replies = run(&handler, ADMIN, "/listadmins").await;
        assert!(replies[0].contains("Bot owner: not set"));

        let replies = run(&handler, ADMIN, "/admins").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].contains("You are now the owner (ID: 20)"));
        assert!(replies[1].contains("Current owner ID: 20"));
        assert_eq!(handler.store.read().await.owner(), ADMIN);
    }

    #[tokio::test]
    async fn test_provisional_admin_gets_notice() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, 0, vec![]);

        let replies = run(&handler, STRANGER, "/listkeywords").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].starts_with("⚠️ Admin IDs are not configured yet."));
        assert_eq!(replies[1], "🔑 Current keywords:\n\n1. urgent");
    }

    #[tokio::test]
    async fn test_keyword_commands() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        assert_eq!(
            run(&handler, ADMIN, "/addkeyword sale").await,
            vec!["✅ Keyword 'sale' was added."]
        );
        assert_eq!(
            run(&handler, ADMIN, "/addkeyword sale").await,
            vec!["⚠️ Keyword 'sale' already exists."]
        );
        assert_eq!(
            run(&handler, ADMIN, "/deletekeyword urgent").await,
            vec!["✅ Keyword 'urgent' was deleted."]
        );
        assert_eq!(
            run(&handler, ADMIN, "/deletekeyword urgent").await,
            vec!["⚠️ Keyword 'urgent' does not exist."]
        );
        assert_eq!(
            run(&handler, ADMIN, "/addkeyword").await,
            vec!["❌ Correct usage: /addkeyword <keyword>"]
        );
        assert_eq!(handler.store.read().await.keywords(), &["sale".to_owned()]);
    }

    #[tokio::test]
    async fn test_actions_reply_with_progress_note() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        assert_eq!(
            run(&handler, ADMIN, "/send @bob hi there").await,
            vec![
                "⏳ Sending the message to @bob...",
                "✅ Message sent successfully to @bob"
            ]
        );
        assert_eq!(
            run(&handler, ADMIN, "/broadcast hello all").await,
            vec![
                "⏳ Sending the message to every group...",
                "✅ Broadcast complete: Sent to 2 groups/channels, failed in 0 groups/channels."
            ]
        );
        assert_eq!(
            run(&handler, ADMIN, "/send").await,
            vec!["❌ Correct usage: /send <username_or_id> <message>"]
        );
    }

    #[tokio::test]
    async fn test_admin_plain_text_and_unknown_commands() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        let replies = run(&handler, ADMIN, "hello").await;
        assert_eq!(
            replies,
            vec!["Message received: hello\nUse /help to see the list of commands."]
        );

        let replies = run(&handler, ADMIN, "/bogus").await;
        assert!(replies[0].starts_with("❓ Unknown command /bogus."));
    }

    #[tokio::test]
    async fn test_help_and_start() {
        let dir = tempdir().unwrap();
        let handler = handler(&dir, OWNER, vec![OWNER, ADMIN]);

        let help = run(&handler, ADMIN, "/help@relay_bot").await;
        assert!(help[0].contains("/addadmin <user_id> - Add an admin"));
        assert!(help[0].contains("/listadmins - List the admins"));

        let start = run(&handler, ADMIN, "/start").await;
        assert!(start[0].starts_with("👋 Welcome"));
        assert!(!start[0].contains("No owner is set"));
    }
}
