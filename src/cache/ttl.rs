//! Generic time-to-live cache.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    created_at: DateTime<Utc>,
}

/// String-keyed cache whose entries expire `ttl` after insertion.
///
/// Expired entries are evicted lazily by the lookup that finds them. Inserts
/// replace whole entries, so concurrent writers to one key resolve as last
/// writer wins. Every operation has an `_at` variant taking the current time
/// explicitly.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl<V> TtlCache<V> {
    pub fn new(ttl: std::time::Duration, max_entries: Option<usize>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            max_entries,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key` as of `now`, evicting it if it has expired.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<Arc<V>> {
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !self.is_expired(entry, now) => {
                    return Some(Arc::clone(&entry.value));
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        // re-check: another writer may have refreshed the entry
        match entries.get(key) {
            Some(entry) if !self.is_expired(entry, now) => Some(Arc::clone(&entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) -> Arc<V> {
        self.insert_at(key, value, Utc::now())
    }

    /// Store `value` under `key` as created at `now`.
    pub fn insert_at(&self, key: impl Into<String>, value: V, now: DateTime<Utc>) -> Arc<V> {
        let key = key.into();
        let value = Arc::new(value);
        let mut entries = self.entries.write();

        if let Some(limit) = self.max_entries {
            if !entries.contains_key(&key) && entries.len() >= limit {
                entries.retain(|_, e| now - e.created_at < self.ttl);
                if entries.len() >= limit {
                    // drop the oldest entry to make room
                    if let Some(oldest) = entries
                        .iter()
                        .min_by_key(|(_, e)| e.created_at)
                        .map(|(k, _)| k.clone())
                    {
                        entries.remove(&oldest);
                    }
                }
            }
        }

        entries.insert(
            key,
            Entry {
                value: Arc::clone(&value),
                created_at: now,
            },
        );
        value
    }

    /// When the entry under `key` was created, expired or not.
    pub fn created_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.read().get(key).map(|e| e.created_at)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn is_expired(&self, entry: &Entry<V>, now: DateTime<Utc>) -> bool {
        now - entry.created_at >= self.ttl
    }
}
