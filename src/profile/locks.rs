//! Striped per-email locks.
//!
//! A fixed array of async mutexes indexed by a hash of the email. Two lookups for
//! the same email always meet on the same stripe; unrelated emails share a stripe
//! only by hash accident. Memory stays constant regardless of how many distinct
//! emails are looked up.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tokio::sync::Mutex;

pub struct LockStripes {
    stripes: Vec<Mutex<()>>,
}

impl LockStripes {
    pub fn new(count: usize) -> Self {
        let count = count.max(1);
        Self {
            stripes: (0..count).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn stripe_for(&self, email: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        email.hash(&mut hasher);
        (hasher.finish() % self.stripes.len() as u64) as usize
    }

    pub fn lock_for(&self, email: &str) -> &Mutex<()> {
        &self.stripes[self.stripe_for(email)]
    }

    pub fn len(&self) -> usize {
        self.stripes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stripes.is_empty()
    }
}
