//! Named rate limiters

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Error, RateLimitConfig};

/// A shared rate limiter referenced by name
///
/// `access` returns `None` when the caller may proceed, or the duration to
/// wait before trying again.
pub trait RateLimit: Send + Sync {
    /// Request one unit of access
    fn access(&self) -> Option<Duration>;
}

/// Build a rate limiter from configuration
pub(crate) fn new_rate_limit(conf: &RateLimitConfig) -> Result<Arc<dyn RateLimit>, Error> {
    match conf.kind.as_str() {
        "local" => Ok(Arc::new(LocalRateLimit::new(&conf.local)?)),
        other => Err(Error::UnknownRateLimitType(other.to_string())),
    }
}

/// Configuration for the in-process rate limiter
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocalRateLimitConfig {
    /// Accesses allowed per interval
    pub count: usize,

    /// Window length in milliseconds
    pub interval_ms: u64,
}

impl Default for LocalRateLimitConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            interval_ms: 1000,
        }
    }
}

struct Window {
    started: Instant,
    used: usize,
}

/// In-process token window: `count` accesses per `interval`
pub struct LocalRateLimit {
    count: usize,
    interval: Duration,
    window: Mutex<Window>,
}

impl LocalRateLimit {
    /// Create a rate limiter from configuration; a zero count is rejected
    pub fn new(conf: &LocalRateLimitConfig) -> Result<Self, Error> {
        if conf.count == 0 {
            return Err(Error::Config(
                "rate limit count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            count: conf.count,
            interval: Duration::from_millis(conf.interval_ms),
            window: Mutex::new(Window {
                started: Instant::now(),
                used: 0,
            }),
        })
    }
}

impl RateLimit for LocalRateLimit {
    fn access(&self) -> Option<Duration> {
        let now = Instant::now();
        let mut window = self.window.lock();

        let elapsed = now.duration_since(window.started);
        if elapsed >= self.interval {
            window.started = now;
            window.used = 0;
        }

        if window.used < self.count {
            window.used += 1;
            None
        } else {
            Some(self.interval.saturating_sub(elapsed))
        }
    }
}
