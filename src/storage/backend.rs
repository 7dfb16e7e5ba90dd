use super::types::{BatchInsert, NewUser, UserId, UserRecord};
use crate::error::{Error, Result};
use crate::hashing::Offset;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Bit-vector operations on a named key.
#[async_trait]
pub trait BitStore: Send + Sync {
    async fn get_bit(&self, key: &str, offset: Offset) -> Result<bool>;

    /// Sets or clears a bit and returns its previous value.
    async fn set_bit(&self, key: &str, offset: Offset, value: bool) -> Result<bool>;
}

/// String values with a per-entry expiration.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// The `users` relation.
///
/// Implementations must enforce uniqueness of both `email` and `offset` and report a
/// violation from [`UserStore::insert`] as `Error::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<UserRecord>;

    /// Bulk insert. Rows violating a unique constraint are skipped, any other
    /// failure rejects the whole batch.
    async fn insert_batch(&self, users: Vec<NewUser>) -> Result<BatchInsert>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn find_by_offset(&self, offset: Offset) -> Result<Option<UserRecord>>;

    /// Up to `limit` records with `id > after`, ordered by id ascending.
    async fn scan_page(&self, after: Option<UserId>, limit: usize) -> Result<Vec<UserRecord>>;
}

/// Runs a collaborator call under a deadline.
pub async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} timed out after {:?}", what, limit);
            Err(Error::Timeout(what.to_string()))
        }
    }
}
