//! In-memory `users` relation.
//!
//! Mirrors the relational table: an identity sequence, a unique index on `email`
//! and a unique index on `email_hash`. Both indexes are checked and updated under
//! one lock, so an insert is atomic with respect to both constraints.

use super::backend::UserStore;
use super::types::{BatchInsert, NewUser, UserId, UserRecord};
use crate::error::{Error, Result, UniqueField};
use crate::hashing::Offset;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Default)]
struct UserTable {
    rows: BTreeMap<UserId, UserRecord>,
    by_email: HashMap<String, UserId>,
    by_offset: HashMap<Offset, UserId>,
    next_id: UserId,
}

impl UserTable {
    fn conflict(&self, user: &NewUser) -> Option<UniqueField> {
        if self.by_email.contains_key(&user.email) {
            Some(UniqueField::Email)
        } else if self.by_offset.contains_key(&user.offset) {
            Some(UniqueField::Offset)
        } else {
            None
        }
    }

    fn push(&mut self, user: NewUser) -> UserRecord {
        self.next_id += 1;
        let record = UserRecord {
            id: self.next_id,
            email: user.email,
            offset: user.offset,
            created_at: Utc::now(),
        };
        self.by_email.insert(record.email.clone(), record.id);
        self.by_offset.insert(record.offset, record.id);
        self.rows.insert(record.id, record.clone());
        record
    }
}

/// In-process `users` table with unique email and offset indexes.
pub struct MemoryUserStore {
    table: Mutex<UserTable>,
    lookups: AtomicUsize,
    available: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryUserStore {
    /// Creates an empty, available store with no added latency.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(UserTable::default()),
            lookups: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Simulates losing (`false`) or regaining (`true`) the database connection.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Adds a fixed delay in front of every operation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of point lookups (by email or by offset) served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Row count. A poisoned table is logged and counted as empty.
    pub fn len(&self) -> usize {
        match self.table() {
            Ok(table) => table.rows.len(),
            Err(e) => {
                tracing::warn!("Cannot count users: {}", e);
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn round_trip(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(Error::Store("connection refused".to_string()));
        }
        Ok(())
    }

    fn table(&self) -> Result<MutexGuard<'_, UserTable>> {
        self.table
            .lock()
            .map_err(|_| Error::Store("user table lock poisoned".to_string()))
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserRecord> {
        self.round_trip().await?;

        let mut table = self.table()?;
        if let Some(field) = table.conflict(&user) {
            tracing::debug!("Insert of {} rejected: duplicate {}", user.email, field);
            return Err(Error::Conflict(field));
        }
        Ok(table.push(user))
    }

    async fn insert_batch(&self, users: Vec<NewUser>) -> Result<BatchInsert> {
        self.round_trip().await?;

        let mut table = self.table()?;
        let mut outcome = BatchInsert::default();
        for user in users {
            if table.conflict(&user).is_some() {
                outcome.skipped += 1;
                continue;
            }
            table.push(user);
            outcome.inserted += 1;
        }
        Ok(outcome)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let table = self.table()?;
        Ok(table
            .by_email
            .get(email)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn find_by_offset(&self, offset: Offset) -> Result<Option<UserRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.round_trip().await?;

        let table = self.table()?;
        Ok(table
            .by_offset
            .get(&offset)
            .and_then(|id| table.rows.get(id))
            .cloned())
    }

    async fn scan_page(&self, after: Option<UserId>, limit: usize) -> Result<Vec<UserRecord>> {
        self.round_trip().await?;

        let table = self.table()?;
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        Ok(table
            .rows
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
