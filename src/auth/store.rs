//! Owner, admin and keyword state with persistence.

use thiserror::Error;
use tracing::{info, warn};

use super::persist::{ListFile, PersistError};
use crate::config::AccessSettings;
use crate::relay::{KeywordMatcher, compile_keyword, has_word_edges};

/// Admin-list value meaning "no admins configured yet".
///
/// While the admin list holds this sentinel, any caller is accepted as a
/// provisional admin. The window closes once an owner is claimed.
pub const UNCONFIGURED_ADMIN: i64 = 0;

/// Keywords seeded into a fresh keyword file.
pub const DEFAULT_KEYWORDS: [&str; 4] = ["عاجل", "خصم", "هام", "حصري"];

/// Errors from store mutations. A failed mutation leaves the store unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User {0} is already an admin")]
    DuplicateAdmin(i64),

    #[error("User {0} is not an admin")]
    UnknownAdmin(i64),

    #[error("The bot owner cannot be removed from the admin list")]
    OwnerProtected,

    #[error("Invalid admin ID: {0}")]
    InvalidAdminId(i64),

    #[error("Keyword '{0}' already exists")]
    DuplicateKeyword(String),

    #[error("Keyword '{0}' does not exist")]
    UnknownKeyword(String),

    #[error("Invalid keyword: '{0}'")]
    InvalidKeyword(String),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Errors from authorization checks and the owner claim.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Caller is not an admin")]
    NotAdmin,

    #[error("Caller is not the owner")]
    NotOwner,

    #[error("The owner is already set")]
    OwnerAlreadyClaimed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How a caller passed the admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAccess {
    /// Caller is in the admin list.
    Admin,

    /// Admin list is unconfigured, so every caller is accepted.
    Provisional,
}

/// Authorization state: owner id, admin ids and monitored keywords.
///
/// Every successful mutation rewrites the corresponding list file.
#[derive(Debug)]
pub struct AuthorizationStore {
    owner_id: i64,
    admins: Vec<i64>,
    keywords: Vec<String>,
    matcher: KeywordMatcher,
    admin_file: ListFile<i64>,
    keyword_file: ListFile<String>,
}

impl AuthorizationStore {
    /// Opens the store from its files, seeding them when absent.
    ///
    /// Admins come from the admin file, or from the environment-provided
    /// ids (plus the owner) when the file is missing or unreadable; an
    /// empty result becomes the unconfigured sentinel. Keywords come from
    /// the keyword file, or the defaults when it is missing.
    pub fn open(settings: &AccessSettings) -> Result<Self, StoreError> {
        let admin_file = ListFile::new(&settings.admins_path);
        let keyword_file = ListFile::new(&settings.keywords_path);

        let (admins, admins_from_file) = match admin_file.load() {
            Ok(Some(admins)) => (admins, true),
            Ok(None) => (settings.admin_ids.clone(), false),
            Err(e) => {
                warn!("Error loading admin IDs, using environment: {}", e);
                (settings.admin_ids.clone(), false)
            }
        };

        let (keywords, keywords_from_file) = match keyword_file.load() {
            Ok(Some(keywords)) => (keywords, true),
            Ok(None) => (default_keywords(), false),
            Err(e) => {
                warn!("Error loading keywords, using defaults: {}", e);
                // Keep the unreadable file for manual repair.
                (default_keywords(), true)
            }
        };

        let store = Self::from_parts(
            settings.owner_id,
            admins.clone(),
            keywords,
            admin_file,
            keyword_file,
        );

        if !admins_from_file || store.admins != admins {
            store.admin_file.save(&store.admins)?;
        }
        if !keywords_from_file {
            store.keyword_file.save(&store.keywords)?;
        }

        if store.is_unconfigured() {
            warn!(
                "No admin IDs are configured: any caller is accepted as a provisional admin \
                 until an owner is claimed"
            );
        }
        info!(
            "Loaded {} admins and {} keywords (owner: {})",
            store.admins.len(),
            store.keywords.len(),
            store.owner_id
        );

        Ok(store)
    }

    /// Builds a store from in-memory data, normalizing it:
    /// duplicates are dropped, the owner is added to the admins, the
    /// sentinel is kept only when no real admin exists.
    #[must_use]
    pub fn from_parts(
        owner_id: i64,
        admins: Vec<i64>,
        keywords: Vec<String>,
        admin_file: ListFile<i64>,
        keyword_file: ListFile<String>,
    ) -> Self {
        let owner_id = owner_id.max(0);

        let mut normalized: Vec<i64> = Vec::with_capacity(admins.len() + 1);
        for id in admins {
            if id >= 0 && !normalized.contains(&id) {
                normalized.push(id);
            }
        }
        if owner_id != 0 && !normalized.contains(&owner_id) {
            normalized.push(owner_id);
        }
        if normalized.iter().any(|&id| id != UNCONFIGURED_ADMIN) {
            normalized.retain(|&id| id != UNCONFIGURED_ADMIN);
        } else {
            normalized = vec![UNCONFIGURED_ADMIN];
        }

        let mut unique_keywords: Vec<String> = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            if !keyword.is_empty() && !unique_keywords.contains(&keyword) {
                unique_keywords.push(keyword);
            }
        }

        Self {
            owner_id,
            admins: normalized,
            matcher: KeywordMatcher::new(&unique_keywords),
            keywords: unique_keywords,
            admin_file,
            keyword_file,
        }
    }

    /// Current owner id, 0 when unset.
    #[must_use]
    pub const fn owner(&self) -> i64 {
        self.owner_id
    }

    /// Whether an owner has been set.
    #[must_use]
    pub const fn is_owner_configured(&self) -> bool {
        self.owner_id != 0
    }

    /// Whether `caller` is the configured owner.
    #[must_use]
    pub const fn is_owner(&self, caller: i64) -> bool {
        self.owner_id != 0 && self.owner_id == caller
    }

    /// Whether the admin list still holds the unconfigured sentinel.
    #[must_use]
    pub fn is_unconfigured(&self) -> bool {
        self.admins.contains(&UNCONFIGURED_ADMIN)
    }

    /// How `caller` passes the admin check, if at all.
    #[must_use]
    pub fn admin_access(&self, caller: i64) -> Option<AdminAccess> {
        if self.is_unconfigured() {
            Some(AdminAccess::Provisional)
        } else if self.admins.contains(&caller) {
            Some(AdminAccess::Admin)
        } else {
            None
        }
    }

    /// Whether `caller` may run admin commands.
    #[must_use]
    pub fn require_admin(&self, caller: i64) -> bool {
        self.admin_access(caller).is_some()
    }

    /// Makes `caller` the owner. Only valid while no owner is set and the
    /// caller passes the admin check.
    ///
    /// The caller is added to the admins and the unconfigured sentinel is
    /// dropped, closing the provisional-admin window.
    pub fn claim_owner(&mut self, caller: i64) -> Result<(), AuthError> {
        if self.is_owner_configured() {
            return Err(AuthError::OwnerAlreadyClaimed);
        }
        if caller <= 0 {
            return Err(StoreError::InvalidAdminId(caller).into());
        }
        if !self.require_admin(caller) {
            return Err(AuthError::NotAdmin);
        }

        let previous = self.admins.clone();
        self.admins.retain(|&id| id != UNCONFIGURED_ADMIN);
        if !self.admins.contains(&caller) {
            self.admins.push(caller);
        }
        self.commit_admins(previous)?;

        self.owner_id = caller;
        info!("User {} claimed ownership of the bot", caller);
        Ok(())
    }

    /// Adds an admin.
    pub fn add_admin(&mut self, id: i64) -> Result<(), StoreError> {
        if id <= 0 {
            return Err(StoreError::InvalidAdminId(id));
        }
        if self.admins.contains(&id) {
            return Err(StoreError::DuplicateAdmin(id));
        }

        let previous = self.admins.clone();
        self.admins.retain(|&existing| existing != UNCONFIGURED_ADMIN);
        self.admins.push(id);
        self.commit_admins(previous)?;

        info!("Added admin {}", id);
        Ok(())
    }

    /// Removes an admin. The owner cannot be removed.
    pub fn remove_admin(&mut self, id: i64) -> Result<(), StoreError> {
        if self.is_owner(id) {
            return Err(StoreError::OwnerProtected);
        }
        let Some(index) = self.admins.iter().position(|&existing| existing == id) else {
            return Err(StoreError::UnknownAdmin(id));
        };

        let previous = self.admins.clone();
        self.admins.remove(index);
        self.commit_admins(previous)?;

        info!("Removed admin {}", id);
        Ok(())
    }

    /// Adds a keyword to monitor.
    pub fn add_keyword(&mut self, keyword: &str) -> Result<(), StoreError> {
        if keyword.is_empty() || compile_keyword(keyword).is_err() {
            return Err(StoreError::InvalidKeyword(keyword.to_owned()));
        }
        if self.keywords.iter().any(|existing| existing == keyword) {
            return Err(StoreError::DuplicateKeyword(keyword.to_owned()));
        }
        if !has_word_edges(keyword) {
            warn!(
                "Keyword '{}' starts or ends with a non-word character; \
                 it only matches where it touches a letter or digit",
                keyword
            );
        }

        let previous = self.keywords.clone();
        self.keywords.push(keyword.to_owned());
        self.commit_keywords(previous)?;

        info!("Added keyword '{}'", keyword);
        Ok(())
    }

    /// Removes a keyword.
    pub fn remove_keyword(&mut self, keyword: &str) -> Result<(), StoreError> {
        let Some(index) = self.keywords.iter().position(|existing| existing == keyword) else {
            return Err(StoreError::UnknownKeyword(keyword.to_owned()));
        };

        let previous = self.keywords.clone();
        self.keywords.remove(index);
        self.commit_keywords(previous)?;

        info!("Removed keyword '{}'", keyword);
        Ok(())
    }

    /// Admin ids in insertion order.
    #[must_use]
    pub fn admins(&self) -> &[i64] {
        &self.admins
    }

    /// Monitored keywords in configured order.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword occurring in `text` as a whole word.
    #[must_use]
    pub fn find_keyword(&self, text: &str) -> Option<&str> {
        self.matcher.find(text)
    }

    fn commit_admins(&mut self, previous: Vec<i64>) -> Result<(), StoreError> {
        if let Err(e) = self.admin_file.save(&self.admins) {
            warn!("Failed to save admin IDs: {}", e);
            self.admins = previous;
            return Err(e.into());
        }
        Ok(())
    }

    fn commit_keywords(&mut self, previous: Vec<String>) -> Result<(), StoreError> {
        if let Err(e) = self.keyword_file.save(&self.keywords) {
            warn!("Failed to save keywords: {}", e);
            self.keywords = previous;
            return Err(e.into());
        }
        self.matcher = KeywordMatcher::new(&self.keywords);
        Ok(())
    }
}

fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|&k| k.to_owned()).collect()
}
