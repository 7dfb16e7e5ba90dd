use crate::error::Result;
use crate::hashing::Offset;
use crate::storage::{BitStore, bounded};

use std::sync::Arc;
use std::time::Duration;

/// Name of the bitmap holding registered email offsets.
pub const EMAIL_HASH_KEY: &str = "registered_emails_hash";

#[derive(Clone)]
pub struct MembershipIndex {
    store: Arc<dyn BitStore>,
    key: String,
    io_timeout: Duration,
}

impl MembershipIndex {
    pub fn new(store: Arc<dyn BitStore>, io_timeout: Duration) -> Self {
        Self::with_key(store, EMAIL_HASH_KEY, io_timeout)
    }

    pub fn with_key(store: Arc<dyn BitStore>, key: &str, io_timeout: Duration) -> Self {
        Self {
            store,
            key: key.to_string(),
            io_timeout,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the bit at `offset` is set.
    pub async fn test(&self, offset: Offset) -> Result<bool> {
        bounded(self.io_timeout, "GETBIT", self.store.get_bit(&self.key, offset)).await
    }

    /// Sets or clears the bit at `offset`, returning the value it had before.
    pub async fn set(&self, offset: Offset, value: bool) -> Result<bool> {
        let previous = bounded(
            self.io_timeout,
            "SETBIT",
            self.store.set_bit(&self.key, offset, value),
        )
        .await?;
        tracing::trace!("Index bit {} set to {} (was {})", offset, value, previous);
        Ok(previous)
    }
}
