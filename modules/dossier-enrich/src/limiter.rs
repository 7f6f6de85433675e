use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// Enforces a minimum interval between consecutive outbound requests.
pub struct RateLimiter {
    min_interval: Duration,
    clock: Arc<dyn Clock>,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            min_interval,
            clock,
            last: Mutex::new(None),
        }
    }

    /// Wait until the next request is allowed and claim the slot.
    pub async fn acquire(&self) {
        let wait = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let now = self.clock.now();
            let wait = match *last {
                Some(prev) => (prev + self.min_interval).saturating_duration_since(now),
                None => Duration::ZERO,
            };
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            self.clock.sleep(wait).await;
        }
    }
}
