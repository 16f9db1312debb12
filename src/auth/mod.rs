//! Authorization module.
//!
//! Owns the owner/admin/keyword state, its JSON persistence, and the
//! gate that every privileged command passes through.

mod gate;
mod persist;
mod store;

pub use gate::{Access, Permission, authorize};
pub use persist::{ListFile, PersistError};
pub use store::{
    AdminAccess, AuthError, AuthorizationStore, DEFAULT_KEYWORDS, StoreError, UNCONFIGURED_ADMIN,
};
