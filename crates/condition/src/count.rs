//! Check-counting condition

use std::sync::atomic::{AtomicU64, Ordering};

use weir_protocol::Message;

use crate::{Condition, CountConfig, Error};

/// True on every Nth check
///
/// The tally is shared across clones of the owning `Arc`, so a single
/// configured count condition observes every message that passes it.
pub struct CountCondition {
    arg: u64,
    counter: AtomicU64,
}

impl CountCondition {
    /// Build from configuration; a zero target is rejected
    pub fn new(conf: &CountConfig) -> Result<Self, Error> {
        if conf.arg == 0 {
            return Err(Error::Config("count arg must be at least 1".to_string()));
        }
        Ok(Self {
            arg: conf.arg,
            counter: AtomicU64::new(0),
        })
    }
}

impl Condition for CountCondition {
    fn check(&self, _msg: &Message) -> bool {
        let seen = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        seen % self.arg == 0
    }

    fn name(&self) -> &'static str {
        "count"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_protocol::Part;

    #[test]
    fn test_fires_every_nth_check() {
        let cond = CountCondition::new(&CountConfig { arg: 3 }).unwrap();
        let msg = Message::from(Part::new("x"));

        let pattern: Vec<bool> = (0..7).map(|_| cond.check(&msg)).collect();
        assert_eq!(
            pattern,
            vec![false, false, true, false, false, true, false]
        );
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(CountCondition::new(&CountConfig { arg: 0 }).is_err());
    }
}
