//! Time-to-live memoization for any [`DrawFetcher`].
//!
//! Entries live for the process (or until [`CachedFetcher::clear`]) and
//! expire after the configured TTL. Expired entries are dropped when looked
//! up, and swept in bulk once the map grows past [`SWEEP_THRESHOLD`].
//! Only non-empty successful results are kept: a date with no draws yet may
//! get them later, and errors are never cached.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use extracto_core::{DrawDate, DrawSet};

use crate::fetch::{DrawFetcher, DrawQuery, FetchError};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const SWEEP_THRESHOLD: usize = 100;

type CacheKey = (DrawQuery, DrawDate);

struct CacheEntry {
    set: DrawSet,
    stored_at: Instant,
}

pub struct CachedFetcher<F> {
    inner: F,
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<F> CachedFetcher<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // Every critical section leaves the map consistent, so poisoning is ignored.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &CacheKey) -> Option<DrawSet> {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(key)
            && entry.stored_at.elapsed() < self.ttl
        {
            return Some(entry.set.clone());
        }
        entries.remove(key);
        None
    }

    fn store(&self, key: CacheKey, set: DrawSet) {
        let mut entries = self.lock();
        entries.insert(
            key,
            CacheEntry {
                set,
                stored_at: Instant::now(),
            },
        );
        if entries.len() > SWEEP_THRESHOLD {
            let before = entries.len();
            let ttl = self.ttl;
            entries.retain(|_, e| e.stored_at.elapsed() < ttl);
            debug!(evicted = before - entries.len(), "swept expired cache entries");
        }
    }
}

#[async_trait]
impl<F: DrawFetcher> DrawFetcher for CachedFetcher<F> {
    async fn fetch(&self, query: DrawQuery, date: DrawDate) -> Result<DrawSet, FetchError> {
        let key = (query, date);
        if let Some(set) = self.lookup(&key) {
            debug!(date = %date, "cache hit");
            return Ok(set);
        }

        let set = self.inner.fetch(query, date).await?;
        if !set.is_empty() {
            self.store(key, set.clone());
        }
        Ok(set)
    }
}
