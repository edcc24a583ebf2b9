//! Cache Store Module
//!
//! Generic key-value store with per-entry absolute expiration. Expired entries
//! are purged lazily on access and in bulk by the background sweep.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::error::CacheError;

// == Entry Action ==
/// What `ExpiringCache::update` does with an entry after the closure ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    /// Persist the (possibly mutated) value with its original expiration
    Keep,
    /// Delete the entry
    Remove,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    stats: CacheStats,
}

impl<V> Inner<V> {
    /// Drops the entry under `key` if it expired. Returns true if one was dropped.
    fn purge_if_expired(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(now));

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        expired
    }
}

// == Expiring Cache ==
/// Thread-safe store mapping string keys to values with absolute expiry.
///
/// A single mutex guards every entry, so each operation (including the
/// read-modify-write of [`ExpiringCache::update`]) is atomic with respect to
/// all others. No operation performs I/O while holding the lock.
#[derive(Debug)]
pub struct ExpiringCache<V> {
    inner: Mutex<Inner<V>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ExpiringCache<V> {
    // == Constructor ==
    /// Creates an empty cache driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                stats: CacheStats::new(),
            }),
            clock,
        }
    }

    /// Current instant according to the cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<V>>, CacheError> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".to_string()))
    }

    // == Get ==
    /// Returns a copy of the live value stored under `key`.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Result<Option<V>, CacheError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        inner.purge_if_expired(key, self.clock.now());

        let value = inner.entries.get(key).map(|entry| entry.value.clone());
        if value.is_some() {
            inner.stats.record_hit();
        } else {
            inner.stats.record_miss();
        }
        Ok(value)
    }

    // == Set ==
    /// Stores `value` under `key` until `expires_at`.
    ///
    /// Any previous value and expiration for the key are replaced outright.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: V,
        expires_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let entry = CacheEntry::new(value, expires_at);
        inner.entries.insert(key.into(), entry);
        inner.stats.set_total_entries(inner.entries.len());
        Ok(())
    }

    // == Remove ==
    /// Deletes the entry for `key`. Absent keys are ignored.
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        inner.entries.remove(key);
        inner.stats.set_total_entries(inner.entries.len());
        Ok(())
    }

    // == Update ==
    /// Runs `f` on the live value under `key` while holding the cache lock.
    ///
    /// `f` receives the value and the instant read under the lock, and
    /// decides whether the entry is kept (with its original expiration) or
    /// removed. Returns `None` without calling `f` when the key is absent
    /// or expired.
    pub fn update<R, F>(&self, key: &str, f: F) -> Result<Option<R>, CacheError>
    where
        F: FnOnce(&mut V, DateTime<Utc>) -> (EntryAction, R),
    {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let now = self.clock.now();
        inner.purge_if_expired(key, now);

        let Some(entry) = inner.entries.get_mut(key) else {
            inner.stats.record_miss();
            return Ok(None);
        };

        let (action, result) = f(&mut entry.value, now);
        inner.stats.record_hit();

        if action == EntryAction::Remove {
            inner.entries.remove(key);
            inner.stats.set_total_entries(inner.entries.len());
        }
        Ok(Some(result))
    }

    // == Purge Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let now = self.clock.now();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - inner.entries.len();

        inner.stats.record_expirations(removed);
        inner.stats.set_total_entries(inner.entries.len());
        Ok(removed)
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> Result<CacheStats, CacheError> {
        let guard = self.lock()?;
        let mut stats = guard.stats.clone();
        stats.set_total_entries(guard.entries.len());
        Ok(stats)
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.entries.is_empty())
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
