//! User and permission storage.
//!
//! Maps usernames to credentials (SHA-256 digests, never plaintext), an
//! admin flag, and the set of [`Grant`]s the user holds. At most one grant
//! exists per (user, domain, access level) triple; granting the same triple
//! again is a no-op.
//!
//! Two implementations are provided, [`memory::InMemoryUserStore`] and
//! [`file::FileUserStore`]. The former is not durable across restarts. The
//! latter writes its state to disk on each mutation and loads it again on
//! startup.

use crate::access::Grant;
use crate::error::Error;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod file;
pub mod memory;

#[allow(clippy::module_name_repetitions)]
pub use file::FileUserStore;
#[allow(clippy::module_name_repetitions)]
pub use memory::InMemoryUserStore;

/// `DynUserStore` is a type alias for a [`UserStore`] shared by multiple
/// read/write consumers through an [`Arc`] and a [`RwLock`].
#[allow(clippy::module_name_repetitions)]
pub type DynUserStore = Arc<RwLock<dyn UserStore + Send + Sync>>;

/// Hex SHA-256 digest of a password, the form credentials are stored in.
pub fn password_digest(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Async access to users and their domain grants.
#[async_trait::async_trait]
pub trait UserStore {
    /// Check a username/password pair. Unknown users simply fail the check.
    async fn verify_credentials(&self, username: &str, password: &str) -> bool;

    /// Whether the user may call the administrative endpoints.
    async fn is_admin(&self, username: &str) -> bool;

    /// All grants held by the user. Unknown users hold none.
    async fn grants_for(&self, username: &str) -> Vec<Grant>;

    /// Create a user or update an existing user's password and admin flag.
    /// Existing grants are kept on update.
    async fn put_user(&mut self, username: &str, password: &str, admin: bool)
        -> Result<(), Error>;

    /// Add a grant for the user. Granting an already-held triple is a
    /// no-op.
    async fn grant(&mut self, username: &str, grant: Grant) -> Result<(), Error>;

    /// Remove a grant from the user. Fails if the user does not hold it.
    async fn revoke(&mut self, username: &str, grant: &Grant) -> Result<(), Error>;
}
