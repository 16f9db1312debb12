//! Authorization gate in front of every privileged command.

use tracing::{info, warn};

use super::store::{AdminAccess, AuthError, AuthorizationStore};

/// Level a command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Admin,
    Owner,
}

/// How a caller was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Listed admin.
    Admin,

    /// Accepted only because no admins are configured yet.
    Provisional,

    /// The configured owner.
    Owner,

    /// Became the owner with this very call.
    ClaimedOwner,
}

impl Access {
    /// Notice to show the caller before running the command, if any.
    #[must_use]
    pub fn notice(self, caller: i64) -> Option<String> {
        match self {
            Self::Admin | Self::Owner => None,
            Self::Provisional => Some(
                "⚠️ Admin IDs are not configured yet. You were accepted as a provisional admin."
                    .to_owned(),
            ),
            Self::ClaimedOwner => Some(format!(
                "⚠️ No owner was set for this bot. You are now the owner (ID: {caller})."
            )),
        }
    }
}

/// Checks `caller` against the store for the given permission.
///
/// Every command goes through the admin check. Owner commands then either
/// compare against the configured owner or, while no owner is set,
/// explicitly claim ownership for the caller. A rejected caller causes
/// no mutation.
pub fn authorize(
    store: &mut AuthorizationStore,
    caller: i64,
    permission: Permission,
) -> Result<Access, AuthError> {
    let Some(admin_access) = store.admin_access(caller) else {
        info!("Rejected non-admin caller {}", caller);
        return Err(AuthError::NotAdmin);
    };

    if admin_access == AdminAccess::Provisional {
        warn!(
            "Caller {} accepted as provisional admin: admin list is unconfigured",
            caller
        );
    }

    match permission {
        Permission::Admin => Ok(match admin_access {
            AdminAccess::Admin => Access::Admin,
            AdminAccess::Provisional => Access::Provisional,
        }),
        Permission::Owner if store.is_owner_configured() => {
            if store.is_owner(caller) {
                Ok(Access::Owner)
            } else {
                info!("Rejected owner-only command from {}", caller);
                Err(AuthError::NotOwner)
            }
        }
        Permission::Owner => {
            store.claim_owner(caller)?;
            Ok(Access::ClaimedOwner)
        }
    }
}
