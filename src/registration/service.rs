use super::types::{MembershipPolicy, RegisterOutcome, is_blank};
use crate::error::{Error, Result};
use crate::hashing::{Offset, email_offset};
use crate::index::MembershipIndex;
use crate::storage::{NewUser, UserStore, bounded};

use std::sync::Arc;
use std::time::Duration;

/// Check-then-register coordinator over the Membership Index and the user store.
pub struct RegistrationService {
    index: MembershipIndex,
    users: Arc<dyn UserStore>,
    policy: MembershipPolicy,
    /// Deadline for each store call made directly by this service.
    io_timeout: Duration,
}

impl RegistrationService {
    /// Creates a new RegistrationService.
    pub fn new(
        index: MembershipIndex,
        users: Arc<dyn UserStore>,
        policy: MembershipPolicy,
        io_timeout: Duration,
    ) -> Self {
        Self {
            index,
            users,
            policy,
            io_timeout,
        }
    }

    /// Whether `email` is registered. Blank emails answer `false` without I/O.
    pub async fn is_registered(&self, email: &str) -> Result<bool> {
        if is_blank(email) {
            return Ok(false);
        }
        self.check(email, email_offset(email)).await
    }

    async fn check(&self, email: &str, offset: Offset) -> Result<bool> {
        if !self.index.test(offset).await? {
            return Ok(false);
        }

        match self.policy {
            MembershipPolicy::BitOnly => {
                tracing::debug!("Email {} found in index at offset {}", email, offset);
                Ok(true)
            }
            MembershipPolicy::Verified => {
                let owner = bounded(
                    self.io_timeout,
                    "find_by_offset",
                    self.users.find_by_offset(offset),
                )
                .await?;
                let confirmed = owner.as_ref().is_some_and(|record| record.email == email);
                if !confirmed {
                    tracing::debug!(
                        "Offset {} is set but not owned by {} (collision or in-flight insert)",
                        offset,
                        email
                    );
                }
                Ok(confirmed)
            }
        }
    }

    /// Registers `email`.
    ///
    /// Validation and conflicts come back as [`RegisterOutcome`] variants. An
    /// `Err` always means a collaborator failed.
    pub async fn register(&self, email: &str) -> Result<RegisterOutcome> {
        if is_blank(email) {
            return Ok(RegisterOutcome::InvalidEmail);
        }

        let offset = email_offset(email);
        if self.check(email, offset).await? {
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let previous = self.index.set(offset, true).await?;

        let insert = bounded(
            self.io_timeout,
            "insert user",
            self.users.insert(NewUser::with_offset(email, offset)),
        )
        .await;

        match insert {
            Ok(record) => {
                tracing::info!(
                    "Registered {} (id={}, offset={})",
                    record.email,
                    record.id,
                    offset
                );
                Ok(RegisterOutcome::Registered(record))
            }
            Err(Error::Conflict(field)) => {
                tracing::info!(
                    "Registration of {} rejected on duplicate {}, rolling back",
                    email,
                    field
                );
                self.restore(offset, previous).await?;
                Ok(RegisterOutcome::Conflict(field))
            }
            Err(Error::Timeout(what)) => {
                // The insert may still commit; a stale set bit is repaired by
                // reconciliation, a missing one is not.
                tracing::warn!(
                    "Insert of {} timed out, leaving offset {} set",
                    email,
                    offset
                );
                Err(Error::Timeout(what))
            }
            Err(e) => {
                tracing::error!("Failed to persist {}: {}", email, e);
                if let Err(rollback) = self.restore(offset, previous).await {
                    tracing::error!("Rollback of offset {} failed: {}", offset, rollback);
                }
                Err(e)
            }
        }
    }

    /// Puts the bit back to the value observed before the speculative set,
    /// unless a stored row already owns the offset.
    async fn restore(&self, offset: Offset, previous: bool) -> Result<()> {
        if previous {
            // Another registration owns this bit.
            return Ok(());
        }

        // A concurrent registration of the same email (or a colliding one) may
        // have committed after our check. Its row needs the bit.
        let owner = bounded(
            self.io_timeout,
            "find_by_offset",
            self.users.find_by_offset(offset),
        )
        .await;
        match owner {
            Ok(Some(record)) => {
                tracing::debug!(
                    "Offset {} is owned by {} (id={}), keeping it set",
                    offset,
                    record.email,
                    record.id
                );
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => {
                // load_index restores missing bits; it never clears stale ones.
                tracing::warn!(
                    "Could not look up owner of offset {} ({}), clearing it",
                    offset,
                    e
                );
            }
        }

        self.index.set(offset, false).await?;
        tracing::debug!("Offset {} cleared", offset);
        Ok(())
    }
}
