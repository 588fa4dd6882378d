//! Named caches

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{CacheConfig, Error};

/// A shared key-value store referenced by name
///
/// Synchronous, like the rate limiter: the in-process implementation takes
/// no I/O and the processors consulting it are synchronous themselves.
/// External cache services (Redis, Memcached) implement the same trait out
/// of tree behind their own clients.
pub trait Cache: Send + Sync {
    /// Get a value
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Set a value unconditionally
    fn set(&self, key: &str, value: Bytes);

    /// Set a value only if the key is absent; returns whether it was stored
    fn add(&self, key: &str, value: Bytes) -> bool;

    /// Remove a key; returns whether it was present
    fn delete(&self, key: &str) -> bool;
}

/// Build a cache from configuration
pub(crate) fn new_cache(conf: &CacheConfig) -> Result<Arc<dyn Cache>, Error> {
    match conf.kind.as_str() {
        "memory" => Ok(Arc::new(MemoryCache::new(&conf.memory))),
        other => Err(Error::UnknownCacheType(other.to_string())),
    }
}

/// Configuration for the in-process cache
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryCacheConfig {
    /// Entry lifetime in milliseconds; zero keeps entries forever
    pub ttl_ms: u64,

    /// How often expired entries are swept, in milliseconds
    pub compaction_interval_ms: u64,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 0,
            compaction_interval_ms: 60_000,
        }
    }
}

struct MemoryInner {
    entries: HashMap<String, (Bytes, Instant)>,
    last_compaction: Instant,
}

/// In-process cache with optional TTL
///
/// Expired entries are invisible immediately and swept opportunistically on
/// access once per compaction interval.
pub struct MemoryCache {
    ttl: Option<Duration>,
    compaction_interval: Duration,
    inner: Mutex<MemoryInner>,
}

impl MemoryCache {
    /// Create a cache from configuration
    pub fn new(conf: &MemoryCacheConfig) -> Self {
        let ttl = if conf.ttl_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(conf.ttl_ms))
        };
        Self {
            ttl,
            compaction_interval: Duration::from_millis(conf.compaction_interval_ms),
            inner: Mutex::new(MemoryInner {
                entries: HashMap::new(),
                last_compaction: Instant::now(),
            }),
        }
    }

    fn expired(&self, stored: Instant, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.duration_since(stored) >= ttl)
    }

    fn maybe_compact(&self, inner: &mut MemoryInner, now: Instant) {
        if self.ttl.is_none()
            || now.duration_since(inner.last_compaction) < self.compaction_interval
        {
            return;
        }
        let ttl = self.ttl.unwrap_or_default();
        inner
            .entries
            .retain(|_, (_, stored)| now.duration_since(*stored) < ttl);
        inner.last_compaction = now;
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_compact(&mut inner, now);

        match inner.entries.get(key) {
            Some((value, stored)) if !self.expired(*stored, now) => Some(value.clone()),
            _ => None,
        }
    }

    fn set(&self, key: &str, value: Bytes) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_compact(&mut inner, now);
        inner.entries.insert(key.to_string(), (value, now));
    }

    fn add(&self, key: &str, value: Bytes) -> bool {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.maybe_compact(&mut inner, now);

        let live = inner
            .entries
            .get(key)
            .is_some_and(|(_, stored)| !self.expired(*stored, now));
        if live {
            return false;
        }
        inner.entries.insert(key.to_string(), (value, now));
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }
}
