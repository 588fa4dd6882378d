//! Weir Manager - Shared resources by name
//!
//! The manager is the process-wide registry components use to look up shared
//! resources: named caches, named rate limiters, named conditions and inproc
//! pipes. It is fully populated during construction, before any driver task
//! starts, and read-only thereafter (pipes are created lazily but never
//! replaced).
//!
//! Named conditions may reference each other through `resource` conditions;
//! reference cycles are detected during the build and fail fast.

mod cache;
mod config;
mod error;
mod rate_limit;

pub use cache::{Cache, MemoryCache, MemoryCacheConfig};
pub use config::{CacheConfig, RateLimitConfig, ResourcesConfig};
pub use error::Error;
pub use rate_limit::{LocalRateLimit, LocalRateLimitConfig, RateLimit};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use weir_condition::{Condition, ConditionLookup, new_condition};
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, TransactionRx, TransactionTx, transaction_channel,
};

/// Description of a registered resource type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered cache types
pub const CACHE_SPECS: &[TypeSpec] = &[TypeSpec {
    name: "memory",
    description: "An in-process map with optional per-entry TTL. Contents do \
                  not survive restarts.",
}];

/// All registered rate limit types
pub const RATE_LIMIT_SPECS: &[TypeSpec] = &[TypeSpec {
    name: "local",
    description: "An in-process token window allowing a fixed count of \
                  accesses per interval.",
}];

/// Process-wide resource registry
pub struct Manager {
    caches: HashMap<String, Arc<dyn Cache>>,
    rate_limits: HashMap<String, Arc<dyn RateLimit>>,
    conditions: HashMap<String, Arc<dyn Condition>>,
    pipes: Mutex<HashMap<String, (TransactionTx, TransactionRx)>>,
}

impl Manager {
    /// Build every configured resource
    ///
    /// Conditions are resolved depth-first so `resource` references between
    /// named conditions work regardless of declaration order; a reference
    /// cycle fails the build.
    pub fn build(conf: &ResourcesConfig) -> Result<Self, Error> {
        let mut caches: HashMap<String, Arc<dyn Cache>> = HashMap::new();
        for (name, cache_conf) in &conf.caches {
            caches.insert(name.clone(), cache::new_cache(cache_conf)?);
            tracing::debug!(cache = %name, "registered cache resource");
        }

        let mut rate_limits: HashMap<String, Arc<dyn RateLimit>> = HashMap::new();
        for (name, limit_conf) in &conf.rate_limits {
            rate_limits.insert(name.clone(), rate_limit::new_rate_limit(limit_conf)?);
            tracing::debug!(rate_limit = %name, "registered rate limit resource");
        }

        let resolver = ConditionResolver {
            configs: &conf.conditions,
            built: RefCell::new(HashMap::new()),
            building: RefCell::new(HashSet::new()),
        };
        for name in conf.conditions.keys() {
            resolver.condition(name)?;
            tracing::debug!(condition = %name, "registered condition resource");
        }
        let conditions = resolver.built.into_inner();

        Ok(Self {
            caches,
            rate_limits,
            conditions,
            pipes: Mutex::new(HashMap::new()),
        })
    }

    /// Build an empty manager, for topologies without resources
    pub fn empty() -> Self {
        Self {
            caches: HashMap::new(),
            rate_limits: HashMap::new(),
            conditions: HashMap::new(),
            pipes: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a named cache
    pub fn cache(&self, name: &str) -> Option<Arc<dyn Cache>> {
        self.caches.get(name).cloned()
    }

    /// Look up a named rate limiter
    pub fn rate_limit(&self, name: &str) -> Option<Arc<dyn RateLimit>> {
        self.rate_limits.get(name).cloned()
    }

    /// The sending half of a named inproc pipe, created on first use
    pub fn pipe_sender(&self, name: &str) -> TransactionTx {
        self.pipe(name).0
    }

    /// The receiving half of a named inproc pipe, created on first use
    pub fn pipe_receiver(&self, name: &str) -> TransactionRx {
        self.pipe(name).1
    }

    fn pipe(&self, name: &str) -> (TransactionTx, TransactionRx) {
        let mut pipes = self.pipes.lock();
        let (tx, rx) = pipes
            .entry(name.to_string())
            .or_insert_with(|| transaction_channel(DEFAULT_CHANNEL_CAPACITY));
        (tx.clone(), rx.clone())
    }
}

impl ConditionLookup for Manager {
    fn condition(&self, name: &str) -> Result<Arc<dyn Condition>, weir_condition::Error> {
        self.conditions
            .get(name)
            .cloned()
            .ok_or_else(|| weir_condition::Error::UnknownResource(name.to_string()))
    }
}

/// Depth-first named-condition resolver with grey-set cycle detection
struct ConditionResolver<'a> {
    configs: &'a HashMap<String, weir_condition::Config>,
    built: RefCell<HashMap<String, Arc<dyn Condition>>>,
    building: RefCell<HashSet<String>>,
}

impl ConditionLookup for ConditionResolver<'_> {
    fn condition(&self, name: &str) -> Result<Arc<dyn Condition>, weir_condition::Error> {
        if let Some(cond) = self.built.borrow().get(name) {
            return Ok(Arc::clone(cond));
        }
        if !self.building.borrow_mut().insert(name.to_string()) {
            return Err(weir_condition::Error::ResourceCycle(name.to_string()));
        }

        let result = match self.configs.get(name) {
            Some(conf) => new_condition(conf, self),
            None => Err(weir_condition::Error::UnknownResource(name.to_string())),
        };
        self.building.borrow_mut().remove(name);

        let cond = result?;
        self.built
            .borrow_mut()
            .insert(name.to_string(), Arc::clone(&cond));
        Ok(cond)
    }
}

#[cfg(test)]
mod lib_test;
