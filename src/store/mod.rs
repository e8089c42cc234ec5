/// Session Record Store
///
/// Holds at most one refresh-session record per user. Every compound
/// operation is a single atomic step in the backing store so that a login
/// racing a rotation, or two rotations racing each other, resolve to exactly
/// one winning record.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;

pub use memory::InMemorySessionStore;
pub use postgres::PgSessionStore;

/// The current refresh session of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub session_id: String,
    /// Original login time; rotation never moves it
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert or overwrite the record for `record.user_id`
    async fn put(&self, record: &SessionRecord) -> Result<(), StoreError>;

    async fn get(&self, user_id: Uuid) -> Result<Option<SessionRecord>, StoreError>;

    /// Remove the record unconditionally; true if one existed
    async fn delete(&self, user_id: Uuid) -> Result<bool, StoreError>;

    /// Remove the record only while `session_id` is still the current one
    async fn delete_if_current(&self, user_id: Uuid, session_id: &str) -> Result<bool, StoreError>;

    /// Replace `current` with `next`, keeping `created_at`
    ///
    /// Returns false, changing nothing, when `current` is no longer the stored
    /// session.
    async fn rotate(&self, user_id: Uuid, current: &str, next: &str) -> Result<bool, StoreError>;
}
