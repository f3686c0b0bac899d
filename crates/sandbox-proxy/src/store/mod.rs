//! User profile storage: accounts, login sessions and per-user meta entries.
//!
//! Sandbox records live in the meta table under the ten `sandbox_*` keys and
//! are always written or deleted as a unit. Concurrent writers are not
//! coordinated: whichever write lands last replaces the whole record.

mod mem;
mod sqlite;

pub use mem::MemProfileStore;
pub use sqlite::SqliteProfileStore;

use std::collections::HashMap;
use std::sync::Arc;

use sandbox_protocol::SandboxRecord;
use sha2::{Digest, Sha256};

pub type StoreResult<T> = Result<T, StoreError>;
pub type DynProfileStore = Arc<dyn ProfileStore>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait ProfileStore: Send + Sync {
    /// Returns the user with `email`, creating it if needed.
    fn put_user(&self, email: &str) -> StoreResult<User>;

    /// Binds a login session token to a user. Only a digest of the token is kept.
    fn put_session(&self, token: &str, user_id: i64) -> StoreResult<()>;

    fn user_for_session(&self, token: &str) -> StoreResult<Option<User>>;

    /// Replaces every sandbox meta entry of `user_id` in one step.
    fn put_sandbox(&self, user_id: i64, record: &SandboxRecord) -> StoreResult<()>;

    /// Raw `sandbox_*` meta entries of `user_id`.
    fn sandbox_meta(&self, user_id: i64) -> StoreResult<HashMap<String, String>>;

    /// Removes all ten sandbox meta entries of `user_id`.
    fn delete_sandbox(&self, user_id: i64) -> StoreResult<()>;

    /// The stored record, or `None` when any entry is missing or malformed.
    /// Expiry is not checked here.
    fn get_sandbox(&self, user_id: i64) -> StoreResult<Option<SandboxRecord>> {
        let meta = self.sandbox_meta(user_id)?;
        Ok(SandboxRecord::from_meta(|key| meta.get(key).cloned()))
    }
}

/// Digest stored in place of a session token.
pub(crate) fn session_verifier(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
