use crate::hashing::{Offset, email_offset};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identity of a user row.
pub type UserId = i64;

/// A persisted row of the `users` relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    #[serde(rename = "email_hash")]
    pub offset: Offset,
    pub created_at: DateTime<Utc>,
}

/// A row waiting to be inserted. Identity and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub offset: Offset,
}

impl NewUser {
    /// Derives the offset from the email.
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();
        let offset = email_offset(&email);
        Self { email, offset }
    }

    /// Uses an offset computed elsewhere.
    pub fn with_offset(email: impl Into<String>, offset: Offset) -> Self {
        Self {
            email: email.into(),
            offset,
        }
    }
}

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchInsert {
    pub inserted: usize,
    /// Rows dropped because their email or offset already existed.
    pub skipped: usize,
}
