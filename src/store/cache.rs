//! Time-bounded cache for the full-table fetch.
//!
//! Holds at most one entry `(records, fetched_at)`. [`CachedRowSource::get`]
//! returns the entry while it is younger than the TTL and otherwise runs the
//! query once. Failed fetches are never cached, so the next call retries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{DataSourceError, RecordStore};
use crate::model::RecordSet;

/// Default freshness window for fetched rows.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub failures: AtomicU64,
}

impl CacheStats {
    /// Current stats as a tuple: (hits, misses, failures).
    pub fn get(&self) -> (u64, u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            self.failures.load(Ordering::Relaxed),
        )
    }
}

struct CacheEntry {
    records: Arc<RecordSet>,
    fetched_at: Instant,
}

/// A [`RecordStore`] wrapped with a single TTL-bounded cache entry.
pub struct CachedRowSource<S, C = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
    entry: Mutex<Option<CacheEntry>>,
    stats: CacheStats,
}

impl<S: RecordStore> CachedRowSource<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, DEFAULT_TTL, SystemClock)
    }

    pub fn with_ttl(store: S, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, SystemClock)
    }
}

impl<S: RecordStore, C: Clock> CachedRowSource<S, C> {
    pub fn with_clock(store: S, ttl: Duration, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl,
            entry: Mutex::new(None),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached rows if fresh, otherwise query the store once.
    pub fn get(&self) -> Result<Arc<RecordSet>, DataSourceError> {
        let now = self.clock.now();
        let mut entry = self.entry.lock();

        if let Some(cached) = entry.as_ref()
            && now.saturating_duration_since(cached.fetched_at) < self.ttl
        {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                age_ms = now.saturating_duration_since(cached.fetched_at).as_millis() as u64,
                "row cache hit"
            );
            return Ok(Arc::clone(&cached.records));
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        match self.store.fetch_all() {
            Ok(records) => {
                let records = Arc::new(records);
                *entry = Some(CacheEntry {
                    records: Arc::clone(&records),
                    fetched_at: now,
                });
                Ok(records)
            }
            Err(err) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                *entry = None;
                tracing::warn!(error = %err, "inventory fetch failed");
                Err(err)
            }
        }
    }

    /// Drop the cached entry so the next [`get`](Self::get) queries the store.
    pub fn invalidate(&self) {
        *self.entry.lock() = None;
    }

    /// Whether a fresh entry is currently held.
    pub fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.entry
            .lock()
            .as_ref()
            .is_some_and(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
