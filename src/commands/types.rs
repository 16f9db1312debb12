//! Command types and definitions.

use std::fmt;

use thiserror::Error;

use crate::actions::Target;
use crate::auth::Permission;

/// Commands understood by the official bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Help,
    Status,
    Send,
    Broadcast,
    Join,
    Leave,
    Info,
    AddKeyword,
    ListKeywords,
    DeleteKeyword,
    Admins,
    AddAdmin,
    RemoveAdmin,
    ListAdmins,
}

impl CommandKind {
    /// Every command, in help order.
    pub const ALL: [Self; 15] = [
        Self::Start,
        Self::Help,
        Self::Status,
        Self::Send,
        Self::Broadcast,
        Self::Join,
        Self::Leave,
        Self::Info,
        Self::AddKeyword,
        Self::ListKeywords,
        Self::DeleteKeyword,
        Self::Admins,
        Self::AddAdmin,
        Self::RemoveAdmin,
        Self::ListAdmins,
    ];

    /// Looks up a command word (without the `/`).
    ///
    /// Case-insensitive; a trailing `@botname` is ignored.
    #[must_use]
    pub fn from_name(word: &str) -> Option<Self> {
        let word = word.split_once('@').map_or(word, |(name, _)| name);
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(word))
    }

    /// Command word without the `/`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Status => "status",
            Self::Send => "send",
            Self::Broadcast => "broadcast",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::Info => "info",
            Self::AddKeyword => "addkeyword",
            Self::ListKeywords => "listkeywords",
            Self::DeleteKeyword => "deletekeyword",
            Self::Admins => "admins",
            Self::AddAdmin => "addadmin",
            Self::RemoveAdmin => "removeadmin",
            Self::ListAdmins => "listadmins",
        }
    }

    /// Correct form, shown in help and on usage errors.
    #[must_use]
    pub const fn usage(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/help",
            Self::Status => "/status",
            Self::Send => "/send <username_or_id> <message>",
            Self::Broadcast => "/broadcast <message>",
            Self::Join => "/join <group_link>",
            Self::Leave => "/leave <chat_id>",
            Self::Info => "/info <username_or_id>",
            Self::AddKeyword => "/addkeyword <keyword>",
            Self::ListKeywords => "/listkeywords",
            Self::DeleteKeyword => "/deletekeyword <keyword>",
            Self::Admins => "/admins",
            Self::AddAdmin => "/addadmin <user_id>",
            Self::RemoveAdmin => "/removeadmin <user_id>",
            Self::ListAdmins => "/listadmins",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Start using the bot",
            Self::Help => "Show this help message",
            Self::Status => "Check the userbot connection",
            Self::Send => "Send a message to any user or group",
            Self::Broadcast => "Send a message to every group the account is in",
            Self::Join => "Join a group or channel",
            Self::Leave => "Leave a group or channel",
            Self::Info => "Show information about a user",
            Self::AddKeyword => "Add a keyword to monitor",
            Self::ListKeywords => "List the monitored keywords",
            Self::DeleteKeyword => "Stop monitoring a keyword",
            Self::Admins => "Open the admin management panel",
            Self::AddAdmin => "Add an admin",
            Self::RemoveAdmin => "Remove an admin",
            Self::ListAdmins => "List the admins",
        }
    }

    /// Level the caller needs.
    #[must_use]
    pub const fn permission(self) -> Permission {
        match self {
            Self::Admins | Self::AddAdmin | Self::RemoveAdmin => Permission::Owner,
            _ => Permission::Admin,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Splits `/word rest` into the command word and the raw argument text.
///
/// Returns `None` when the text is not a command.
#[must_use]
pub fn split_command(text: &str) -> Option<(&str, &str)> {
    let body = text.trim().strip_prefix('/')?;
    let (word, rest) = body
        .split_once(char::is_whitespace)
        .unwrap_or((body, ""));

    if word.is_empty() {
        return None;
    }
    Some((word, rest.trim()))
}

/// Wrong argument shape for a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("❌ Correct usage: {0}")]
    WrongArguments(&'static str),

    #[error("❌ The user ID must be an integer.")]
    NotAnInteger,
}

/// A fully parsed admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Start,
    Help,
    Status,
    Send { target: Target, text: String },
    Broadcast { text: String },
    Join { link: String },
    Leave { target: Target },
    Info { target: Target },
    AddKeyword(String),
    ListKeywords,
    DeleteKeyword(String),
    Admins,
    AddAdmin(i64),
    RemoveAdmin(i64),
    ListAdmins,
}

impl AdminCommand {
    /// Parses the argument text of a command.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] when the arguments don't have the shape the
    /// command expects.
    pub fn parse(kind: CommandKind, args: &str) -> Result<Self, UsageError> {
        let usage = UsageError::WrongArguments(kind.usage());

        let command = match kind {
            CommandKind::Start => Self::Start,
            CommandKind::Help => Self::Help,
            CommandKind::Status => Self::Status,
            CommandKind::ListKeywords => Self::ListKeywords,
            CommandKind::Admins => Self::Admins,
            CommandKind::ListAdmins => Self::ListAdmins,
            CommandKind::Send => {
                let (target, text) = args.split_once(char::is_whitespace).ok_or(usage.clone())?;
                let text = text.trim();
                if text.is_empty() {
                    return Err(usage);
                }
                Self::Send {
                    target: Target::parse(target).ok_or(usage)?,
                    text: text.to_owned(),
                }
            }
            CommandKind::Broadcast => {
                if args.is_empty() {
                    return Err(usage);
                }
                Self::Broadcast {
                    text: args.to_owned(),
                }
            }
            CommandKind::Join => Self::Join {
                link: single(args).ok_or(usage)?.to_owned(),
            },
            CommandKind::Leave => Self::Leave {
                target: single(args).and_then(Target::parse).ok_or(usage)?,
            },
            CommandKind::Info => Self::Info {
                target: single(args).and_then(Target::parse).ok_or(usage)?,
            },
            CommandKind::AddKeyword => Self::AddKeyword(single(args).ok_or(usage)?.to_owned()),
            CommandKind::DeleteKeyword => {
                Self::DeleteKeyword(single(args).ok_or(usage)?.to_owned())
            }
            CommandKind::AddAdmin => Self::AddAdmin(user_id(args, usage)?),
            CommandKind::RemoveAdmin => Self::RemoveAdmin(user_id(args, usage)?),
        };

        Ok(command)
    }

    /// Acknowledgement sent before a slow action runs.
    #[must_use]
    pub fn progress_note(&self) -> Option<String> {
        Some(match self {
            Self::Status => "⏳ Checking status...".to_owned(),
            Self::Send { target, .. } => format!("⏳ Sending the message to {target}..."),
            Self::Broadcast { .. } => "⏳ Sending the message to every group...".to_owned(),
            Self::Join { .. } => "⏳ Joining...".to_owned(),
            Self::Leave { .. } => "⏳ Leaving the chat...".to_owned(),
            Self::Info { .. } => "⏳ Fetching information...".to_owned(),
            _ => return None,
        })
    }
}

/// The only whitespace-separated token in `args`.
fn single(args: &str) -> Option<&str> {
    let mut tokens = args.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) => Some(token),
        _ => None,
    }
}

fn user_id(args: &str, usage: UsageError) -> Result<i64, UsageError> {
    single(args)
        .ok_or(usage)?
        .parse()
        .map_err(|_| UsageError::NotAnInteger)
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(CommandKind::from_name("start"), Some(CommandKind::Start));
        assert_eq!(CommandKind::from_name("AddAdmin"), Some(CommandKind::AddAdmin));
        assert_eq!(
            CommandKind::from_name("status@relay_bot"),
            Some(CommandKind::Status)
        );
        assert_eq!(CommandKind::from_name("skip"), None);
    }

    #[test]
    fn test_names_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.name()), Some(kind));
            assert!(kind.usage().starts_with(&kind.to_string()));
        }
    }

    #[test]
    fn test_owner_commands() {
        let owner_only: Vec<_> = CommandKind::ALL
            .into_iter()
            .filter(|kind| kind.permission() == Permission::Owner)
            .collect();
        assert_eq!(
            owner_only,
            vec![
                CommandKind::Admins,
                CommandKind::AddAdmin,
                CommandKind::RemoveAdmin
            ]
        );
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/start"), Some(("start", "")));
        assert_eq!(
            split_command("  /send @bob  hello there "),
            Some(("send", "@bob  hello there"))
        );
        assert_eq!(split_command("hello"), None);
        assert_eq!(split_command("/"), None);
    }

    #[test]
    fn test_parse_send() {
        assert_eq!(
            AdminCommand::parse(CommandKind::Send, "@bob hello  there"),
            Ok(AdminCommand::Send {
                target: Target::Handle("bob".to_owned()),
                text: "hello  there".to_owned(),
            })
        );
        assert_eq!(
            AdminCommand::parse(CommandKind::Send, "12345"),
            Err(UsageError::WrongArguments("/send <username_or_id> <message>"))
        );
    }

    #[test]
    fn test_parse_single_argument_commands() {
        assert_eq!(
            AdminCommand::parse(CommandKind::Leave, "-1001234"),
            Ok(AdminCommand::Leave {
                target: Target::NumericId(-1_001_234)
            })
        );
        assert!(AdminCommand::parse(CommandKind::Join, "").is_err());
        assert!(AdminCommand::parse(CommandKind::Info, "a b").is_err());
        assert_eq!(
            AdminCommand::parse(CommandKind::AddKeyword, "حصري"),
            Ok(AdminCommand::AddKeyword("حصري".to_owned()))
        );
    }

    #[test]
    fn test_parse_admin_ids() {
        assert_eq!(
            AdminCommand::parse(CommandKind::AddAdmin, "42"),
            Ok(AdminCommand::AddAdmin(42))
        );
        assert_eq!(
            AdminCommand::parse(CommandKind::RemoveAdmin, "bob"),
            Err(UsageError::NotAnInteger)
        );
        assert_eq!(
            AdminCommand::parse(CommandKind::AddAdmin, ""),
            Err(UsageError::WrongArguments("/addadmin <user_id>"))
        );
    }

    #[test]
    fn test_progress_notes() {
        let send = AdminCommand::Send {
            target: Target::Handle("bob".to_owned()),
            text: "hi".to_owned(),
        };
        assert_eq!(
            send.progress_note().as_deref(),
            Some("⏳ Sending the message to @bob...")
        );
        assert_eq!(AdminCommand::ListKeywords.progress_note(), None);
    }

    #[test]
    fn test_usage_error_text() {
        assert_eq!(
            UsageError::WrongArguments("/join <group_link>").to_string(),
            "❌ Correct usage: /join <group_link>"
        );
    }
}
