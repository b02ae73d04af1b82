//! Keyed response cache with pattern invalidation and change notices.
//!
//! Entries are stored as decoded JSON and replaced wholesale on refetch.
//! Freshness is judged against the injected [`Clock`]: an entry younger than
//! its TTL is [`CacheLookup::Fresh`], an older one is still served as
//! [`CacheLookup::Stale`] until it is invalidated or replaced.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use steward_domain::{CacheKey, KeyPattern};
use tracing::{debug, trace};

use crate::ports::Clock;

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Present and younger than its TTL.
    Fresh(Value),
    /// Present but past its TTL; usable while a refresh runs.
    Stale(Value),
    /// Not cached.
    Absent,
}

impl CacheLookup {
    /// Returns the cached value regardless of freshness.
    #[must_use]
    pub fn value(self) -> Option<Value> {
        match self {
            Self::Fresh(v) | Self::Stale(v) => Some(v),
            Self::Absent => None,
        }
    }

    /// Returns true for fresh entries.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Change notice delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheNotice {
    /// The entry was written.
    Updated(CacheKey),
    /// The entry was dropped by an invalidation.
    Invalidated(CacheKey),
    /// Every entry was dropped.
    Cleared,
}

/// Handle returned by [`ResourceCache::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&CacheNotice) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    pattern: KeyPattern,
    callback: Callback,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    data: Value,
    fetched_at: DateTime<Utc>,
    stale_after: DateTime<Utc>,
}

/// Thread-safe response cache.
pub struct ResourceCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_subscription: AtomicU64,
}

impl ResourceCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Looks up `key`.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> CacheLookup {
        let now = self.clock.now();
        let entries = self.entries.read();
        match entries.get(key) {
            None => CacheLookup::Absent,
            Some(entry) if now < entry.stale_after => CacheLookup::Fresh(entry.data.clone()),
            Some(entry) => {
                trace!(%key, age_s = (now - entry.fetched_at).num_seconds(), "stale cache hit");
                CacheLookup::Stale(entry.data.clone())
            }
        }
    }

    /// Stores `data` under `key`, fresh for `ttl`.
    pub fn set(&self, key: CacheKey, data: Value, ttl: Duration) {
        let fetched_at = self.clock.now();
        let stale_after = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| fetched_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries.write().insert(
            key.clone(),
            CacheEntry {
                data,
                fetched_at,
                stale_after,
            },
        );
        self.notify(&CacheNotice::Updated(key));
    }

    /// Drops every entry matched by `pattern`, returning how many were dropped.
    pub fn invalidate(&self, pattern: &KeyPattern) -> usize {
        let removed: Vec<CacheKey> = {
            let mut entries = self.entries.write();
            let keys: Vec<CacheKey> = entries
                .keys()
                .filter(|key| pattern.matches(key))
                .cloned()
                .collect();
            for key in &keys {
                entries.remove(key);
            }
            keys
        };

        if !removed.is_empty() {
            debug!(?pattern, count = removed.len(), "invalidated cache entries");
        }
        for key in &removed {
            self.notify(&CacheNotice::Invalidated(key.clone()));
        }
        removed.len()
    }

    /// Drops every entry.
    pub fn clear_all(&self) {
        let count = {
            let mut entries = self.entries.write();
            let count = entries.len();
            entries.clear();
            count
        };
        debug!(count, "cleared cache");
        self.notify(&CacheNotice::Cleared);
    }

    /// Registers `callback` for notices about keys matched by `pattern`.
    /// [`CacheNotice::Cleared`] reaches every subscriber.
    ///
    /// Callbacks run synchronously on the thread that changed the cache,
    /// after the cache lock is released; they may read the cache.
    pub fn subscribe<F>(&self, pattern: KeyPattern, callback: F) -> SubscriptionId
    where
        F: Fn(&CacheNotice) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscriptions.write().push(Subscription {
            id,
            pattern,
            callback: Arc::new(callback),
        });
        id
    }

    /// Removes a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        subscriptions.len() != before
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Cached keys, in no particular order.
    #[must_use]
    pub fn keys(&self) -> Vec<CacheKey> {
        self.entries.read().keys().cloned().collect()
    }

    fn notify(&self, notice: &CacheNotice) {
        let callbacks: Vec<Callback> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| match notice {
                CacheNotice::Updated(key) | CacheNotice::Invalidated(key) => s.pattern.matches(key),
                CacheNotice::Cleared => true,
            })
            .map(|s| Arc::clone(&s.callback))
            .collect();

        for callback in callbacks {
            callback(notice);
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.len())
            .field("subscriptions", &self.subscriptions.read().len())
            .finish_non_exhaustive()
    }
}
