//! Time-bounded memoization of read-mostly calls
//!
//! Entries are keyed by string and expire `ttl` after they were stored. Only
//! successful results are stored; a failed fetch leaves the cache untouched
//! so the next caller asks the node again.
//!
//! The lock is never held across a fetch. Two callers that miss at the same
//! time both reach the node and the later write wins.

use gwrpc_core::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Hit and miss counts since the cache was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that had to run the fetch
    pub misses: u64,
}

struct Entry {
    stored_at: Instant,
    ttl: Duration,
    value: Value,
}

impl Entry {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

/// Shared result cache
#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Empty cache with zeroed statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the fresh value under `key`, or run `fetch` and store its result
    ///
    /// A zero `ttl` disables storage for this call.
    pub async fn memoize<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        if let Some(value) = self.get(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(key = %key, "Cache hit");
            return Ok(value);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(key = %key, "Cache miss");

        let value = fetch().await?;
        if !ttl.is_zero() {
            self.entries.lock().await.insert(
                key.to_string(),
                Entry {
                    stored_at: Instant::now(),
                    ttl,
                    value: value.clone(),
                },
            );
        }
        Ok(value)
    }

    /// Fresh value under `key`; expired entries are evicted on the way
    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Drop the entry under `key`
    pub async fn invalidate(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Drop every entry
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored entries, stale ones included
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Hit and miss counts since creation
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
