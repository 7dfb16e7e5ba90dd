//! In-memory remote store.
//!
//! Serves both bitmaps (for the Membership Index) and expiring string values (for
//! the profile cache), the way a single Redis instance would. Bitmaps are split
//! into fixed chunks that are allocated on first write, so a sparse 31-bit
//! keyspace does not cost 256 MiB up front.

use super::backend::{BitStore, CacheStore};
use crate::error::{Error, Result};
use crate::hashing::Offset;

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const CHUNK_BITS: u32 = 1 << 16;
const WORDS_PER_CHUNK: usize = (CHUNK_BITS / 64) as usize;

#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    expires_at: Instant,
}

/// In-process stand-in for the remote bitmap and cache server.
pub struct MemoryRemoteStore {
    /// Structure: `Key -> Chunk index -> Words`.
    bitmaps: Arc<DashMap<String, DashMap<u32, Box<[u64]>>>>,
    /// Structure: `Key -> Value with expiry`.
    strings: Arc<DashMap<String, CachedValue>>,
    available: AtomicBool,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            bitmaps: Arc::new(DashMap::new()),
            strings: Arc::new(DashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates the remote store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::debug!("Remote store availability set to {}", available);
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of set bits under `key`.
    pub fn bit_count(&self, key: &str) -> u64 {
        self.bitmaps
            .get(key)
            .map(|bitmap| {
                bitmap
                    .iter()
                    .map(|chunk| chunk.value().iter().map(|w| w.count_ones() as u64).sum::<u64>())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Number of unexpired string entries.
    pub fn entry_count(&self) -> usize {
        let now = Instant::now();
        self.strings
            .iter()
            .filter(|entry| entry.value().expires_at > now)
            .count()
    }

    /// Writes a raw string value, bypassing the cache trait. Useful for seeding.
    pub fn put_raw(&self, key: &str, value: &str, ttl: Duration) {
        self.strings.insert(
            key.to_string(),
            CachedValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

fn locate(offset: Offset) -> (u32, usize, u64) {
    let bit = offset.get();
    let chunk = bit / CHUNK_BITS;
    let within = bit % CHUNK_BITS;
    (chunk, (within / 64) as usize, 1u64 << (within % 64))
}

#[async_trait]
impl BitStore for MemoryRemoteStore {
    async fn get_bit(&self, key: &str, offset: Offset) -> Result<bool> {
        if !self.is_available() {
            return Err(Error::Bitmap("remote store unavailable".to_string()));
        }

        let (chunk_idx, word, mask) = locate(offset);
        let is_set = self
            .bitmaps
            .get(key)
            .and_then(|bitmap| bitmap.get(&chunk_idx).map(|chunk| chunk[word] & mask != 0))
            .unwrap_or(false);

        Ok(is_set)
    }

    async fn set_bit(&self, key: &str, offset: Offset, value: bool) -> Result<bool> {
        if !self.is_available() {
            return Err(Error::Bitmap("remote store unavailable".to_string()));
        }

        if !self.bitmaps.contains_key(key) {
            self.bitmaps.entry(key.to_string()).or_default();
        }
        let bitmap = self
            .bitmaps
            .get(key)
            .ok_or_else(|| Error::Bitmap(format!("bitmap {} vanished", key)))?;

        let (chunk_idx, word, mask) = locate(offset);

        if !value {
            // Clearing never allocates.
            let Some(mut chunk) = bitmap.get_mut(&chunk_idx) else {
                return Ok(false);
            };
            let previous = chunk[word] & mask != 0;
            chunk[word] &= !mask;
            return Ok(previous);
        }

        let mut chunk = bitmap
            .entry(chunk_idx)
            .or_insert_with(|| vec![0u64; WORDS_PER_CHUNK].into_boxed_slice());
        let previous = chunk[word] & mask != 0;
        chunk[word] |= mask;

        tracing::trace!("SETBIT {} {} -> 1 (was {})", key, offset, previous);
        Ok(previous)
    }
}

#[async_trait]
impl CacheStore for MemoryRemoteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.is_available() {
            return Err(Error::Cache("remote store unavailable".to_string()));
        }

        let cached = self.strings.get(key).map(|entry| entry.value().clone());
        match cached {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value)),
            Some(_) => {
                // Expired entries are dropped lazily on read.
                self.strings
                    .remove_if(key, |_, entry| entry.expires_at <= Instant::now());
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        if !self.is_available() {
            return Err(Error::Cache("remote store unavailable".to_string()));
        }

        self.strings.insert(
            key.to_string(),
            CachedValue {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if !self.is_available() {
            return Err(Error::Cache("remote store unavailable".to_string()));
        }

        self.strings.remove(key);
        Ok(())
    }
}
