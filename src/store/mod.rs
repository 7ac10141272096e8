pub mod entry;

use entry::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The keyspace. One exclusive lock guards the whole mapping; every
/// operation (including its lazy-eviction side effect) is atomic under it.
#[derive(Debug, Default)]
pub struct Store {
    data: HashMap<String, Entry>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            data: HashMap::new(),
        }
    }

    /// Unconditional overwrite.
    pub fn set(&mut self, key: String, value: Vec<u8>, expires_at: Option<u64>) {
        let entry = match expires_at {
            Some(exp) => Entry::with_expiry(value, exp),
            None => Entry::new(value),
        };
        self.data.insert(key, entry);
    }

    /// Get a value, performing lazy expiration.
    pub fn get(&mut self, key: &str) -> Option<&Entry> {
        if self.is_expired(key) {
            self.data.remove(key);
            return None;
        }
        self.data.get(key)
    }

    /// Delete a key. Returns true if an un-expired entry existed; a
    /// logically expired entry is evicted but does not count.
    pub fn del(&mut self, key: &str) -> bool {
        if self.is_expired(key) {
            self.data.remove(key);
            return false;
        }
        self.data.remove(key).is_some()
    }

    /// Check if a key exists (with lazy expiration).
    pub fn exists(&mut self, key: &str) -> bool {
        if self.is_expired(key) {
            self.data.remove(key);
            return false;
        }
        self.data.contains_key(key)
    }

    /// Remaining time-to-live: -2 absent or expired (evicting), -1 present
    /// without expiry, else floor of the remaining whole seconds.
    pub fn ttl_seconds(&mut self, key: &str) -> i64 {
        match self.get(key) {
            Some(entry) => entry.ttl_seconds(),
            None => -2,
        }
    }

    /// Number of entries physically present (expired-but-unevicted included).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Active expiration: examine up to `sample_size` entries in map order
    /// and remove the expired ones. Returns the number removed. Coverage
    /// per call is partial; lazy eviction stays authoritative.
    pub fn evict_expired_sample(&mut self, sample_size: usize) -> usize {
        let expired_keys: Vec<String> = self
            .data
            .iter()
            .take(sample_size)
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.data.remove(&key);
        }
        count
    }

    fn is_expired(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(|entry| entry.is_expired())
    }
}

pub type SharedStore = Arc<Mutex<Store>>;
