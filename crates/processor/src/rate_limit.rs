//! Rate limiting

use std::sync::Arc;

use weir_manager::{Manager, RateLimit};
use weir_metrics::{Metrics, event};
use weir_protocol::{Error as ProtocolError, Message};

use crate::{Error, Processor, ProcessorOutput, RateLimitConfig};

/// Applies a named rate limit to the flow
///
/// The limiter is looked up from the manager by name at construction.
/// Messages over budget settle with a transient error carrying the retry
/// hint; the producing input re-presents them after its backoff, so nothing
/// is lost, only delayed.
pub struct RateLimitProcessor {
    limit: Arc<dyn RateLimit>,
    metrics: Metrics,
}

impl RateLimitProcessor {
    /// Build from configuration; the named rate limit must exist
    pub fn new(
        conf: &RateLimitConfig,
        manager: &Manager,
        metrics: &Metrics,
    ) -> Result<Self, Error> {
        if conf.resource.is_empty() {
            return Err(Error::Config(
                "rate_limit requires a rate limit resource".to_string(),
            ));
        }
        let limit = manager.rate_limit(&conf.resource).ok_or_else(|| {
            Error::Config(format!("unknown rate limit resource '{}'", conf.resource))
        })?;
        Ok(Self {
            limit,
            metrics: metrics.child("rate_limit"),
        })
    }
}

impl Processor for RateLimitProcessor {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        match self.limit.access() {
            None => {
                self.metrics.incr(event::SENT);
                (vec![msg], None)
            }
            Some(wait) => {
                self.metrics.incr(event::ERROR);
                (
                    Vec::new(),
                    Some(Err(ProtocolError::transient(format!(
                        "rate limit exceeded, retry in {}ms",
                        wait.as_millis()
                    )))),
                )
            }
        }
    }

    fn name(&self) -> &'static str {
        "rate_limit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_manager::{LocalRateLimitConfig, ResourcesConfig};
    use weir_protocol::Part;

    fn manager_with_limit(count: usize) -> Manager {
        let mut conf = ResourcesConfig::default();
        conf.rate_limits.insert(
            "budget".to_string(),
            weir_manager::RateLimitConfig {
                local: LocalRateLimitConfig {
                    count,
                    interval_ms: 60_000,
                },
                ..weir_manager::RateLimitConfig::default()
            },
        );
        Manager::build(&conf).unwrap()
    }

    fn limiter(manager: &Manager) -> RateLimitProcessor {
        RateLimitProcessor::new(
            &RateLimitConfig {
                resource: "budget".to_string(),
            },
            manager,
            &Metrics::noop(),
        )
        .unwrap()
    }

    #[test]
    fn test_within_budget_passes_over_budget_rejects() {
        let manager = manager_with_limit(2);
        let processor = limiter(&manager);

        for _ in 0..2 {
            let (out, response) = processor.process(Message::from(Part::new("ok")));
            assert_eq!(out.len(), 1);
            assert!(response.is_none());
        }

        // Third message in the window settles with a retryable error
        let (out, response) = processor.process(Message::from(Part::new("over")));
        assert!(out.is_empty());
        match response {
            Some(Err(err)) => assert!(err.is_retryable()),
            other => panic!("expected a transient rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_rate_limit_rejected_at_build() {
        let manager = Manager::empty();
        let err = RateLimitProcessor::new(
            &RateLimitConfig {
                resource: "missing".to_string(),
            },
            &manager,
            &Metrics::noop(),
        );
        assert!(err.is_err());
    }
}
