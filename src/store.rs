//! Shared key-value store boundary.
//!
//! The guard needs exactly four commands from whatever store all worker
//! processes share: set-if-absent with expiry, get, set with expiry, and bulk
//! delete. Keys and values are plain strings, TTLs are durations. Any store
//! offering those (Redis, etcd, a SQL table with an expiry column) can sit
//! behind [`KvStore`]; [`MemoryStore`] is the in-process implementation used
//! by tests and single-process deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

/// Store communication failure. Distinct from a uniqueness conflict: the
/// store itself could not be reached or answered abnormally, so nothing is
/// known about uniqueness.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically create `key` holding `value` with the given expiry, only
    /// if no live entry exists. Returns the existing value when one was
    /// present (in which case nothing is modified), `None` when this call
    /// created the entry. This is the guard's sole linearization point.
    async fn put_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Option<String>, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Unconditional write with a fresh expiry.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Delete every given key. Deleting an absent key is a no-op.
    async fn delete(&self, keys: &[String]) -> Result<(), StoreError>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory [`KvStore`] with lazy expiry: entries past their deadline are
/// treated as absent and dropped on the next touch.
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Keys currently live, sorted. For test assertions.
    #[doc(hidden)]
    pub fn live_keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Force an entry past its deadline, simulating TTL passage.
    #[doc(hidden)]
    pub fn force_expire(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Instant::now();
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn put_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        if let Some(existing) = entries.get(key) {
            if existing.live(now) {
                return Ok(Some(existing.value.clone()));
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(None)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        match entries.get(key) {
            Some(existing) if existing.live(now) => Ok(Some(existing.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
