use super::locks::LockStripes;
use crate::config::ProfileSettings;
use crate::error::{Error, Result};
use crate::registration::types::is_blank;
use crate::storage::{CacheStore, UserRecord, UserStore, bounded};

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Namespace of cached profiles in the remote store.
pub const PROFILE_KEY_PREFIX: &str = "profile_email_";

pub fn profile_key(email: &str) -> String {
    format!("{}{}", PROFILE_KEY_PREFIX, email)
}

/// Cache-aside profile reader with per-email single-flight.
pub struct ProfileService {
    cache: Arc<dyn CacheStore>,
    users: Arc<dyn UserStore>,
    /// Stripes shared by every email; sized once from the settings.
    locks: LockStripes,
    settings: ProfileSettings,
}

impl ProfileService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        users: Arc<dyn UserStore>,
        settings: ProfileSettings,
    ) -> Self {
        Self {
            cache,
            users,
            locks: LockStripes::new(settings.lock_stripes),
            settings,
        }
    }

    pub async fn find_user(&self, email: &str) -> Result<UserRecord> {
        self.find_user_cancellable(email, &CancellationToken::new())
            .await
    }

    /// Like [`find_user`](Self::find_user), but gives up with `Error::Cancelled`
    /// as soon as `token` fires while waiting for the lock or backing off.
    pub async fn find_user_cancellable(
        &self,
        email: &str,
        token: &CancellationToken,
    ) -> Result<UserRecord> {
        if is_blank(email) {
            return Err(Error::InvalidEmail);
        }
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let key = profile_key(email);
        let attempts = self.settings.max_lookup_attempts;

        for attempt in 1..=attempts {
            if let Some(user) = self.read_cached(&key).await? {
                tracing::trace!("Profile cache hit for {}", email);
                return Ok(user);
            }

            let lock = self.locks.lock_for(email);
            let acquired = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Cancelled),
                acquired = tokio::time::timeout(self.settings.lock_timeout, lock.lock()) => acquired,
            };

            match acquired {
                Ok(guard) => {
                    let result = self.load_and_fill(email, &key).await;
                    drop(guard);
                    return result;
                }
                Err(_) => {
                    tracing::debug!(
                        "Lock for {} busy (attempt {}/{}), backing off",
                        email,
                        attempt,
                        attempts
                    );
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(self.backoff()) => {}
                    }
                }
            }
        }

        tracing::warn!(
            "Profile lookup for {} gave up after {} attempts",
            email,
            attempts
        );
        Err(Error::Timeout(format!("profile lookup for {}", email)))
    }

    /// Base backoff plus up to half of it again as jitter.
    fn backoff(&self) -> Duration {
        let base = self.settings.retry_backoff;
        let spread = (base.as_millis() as u64) / 2;
        let jitter = if spread == 0 {
            0
        } else {
            rand::random::<u64>() % (spread + 1)
        };
        base + Duration::from_millis(jitter)
    }

    /// Runs with the stripe lock held.
    async fn load_and_fill(&self, email: &str, key: &str) -> Result<UserRecord> {
        if let Some(user) = self.read_cached(key).await? {
            tracing::debug!("Profile for {} filled by another lookup", email);
            return Ok(user);
        }

        let io_timeout = self.settings.io_timeout;
        let found = bounded(io_timeout, "find_by_email", self.users.find_by_email(email)).await?;
        let Some(user) = found else {
            return Err(Error::NotFound(email.to_string()));
        };

        // The cache is advisory; a failed fill still answers the request.
        match serde_json::to_string(&user) {
            Ok(payload) => {
                let fill = bounded(
                    io_timeout,
                    "cache SET",
                    self.cache.set_ex(key, payload, self.settings.cache_ttl),
                )
                .await;
                if let Err(e) = fill {
                    tracing::warn!("Failed to cache profile for {}: {}", email, e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize profile for {}: {}", email, e),
        }

        tracing::debug!("Loaded profile for {} from store", email);
        Ok(user)
    }

    /// A corrupt payload counts as a miss and is removed.
    async fn read_cached(&self, key: &str) -> Result<Option<UserRecord>> {
        let io_timeout = self.settings.io_timeout;
        let Some(payload) = bounded(io_timeout, "cache GET", self.cache.get(key)).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<UserRecord>(&payload) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {}: {}", key, e);
                if let Err(e) = bounded(io_timeout, "cache DEL", self.cache.delete(key)).await {
                    tracing::warn!("Failed to delete corrupt entry {}: {}", key, e);
                }
                Ok(None)
            }
        }
    }
}
