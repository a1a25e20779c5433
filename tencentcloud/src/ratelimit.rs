//! Per-action request rate limiting
//!
//! Each API action (for example `DescribeInstances`) gets its own token
//! bucket so that a burst of polling reads on one action never starves
//! unrelated mutations.

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

#[derive(Clone)]
pub struct ActionRateLimiter {
    limiter: Arc<KeyedLimiter>,
    per_second: NonZeroU32,
}

impl std::fmt::Debug for ActionRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRateLimiter")
            .field("per_second", &self.per_second)
            .finish()
    }
}

impl ActionRateLimiter {
    pub fn new(per_second: NonZeroU32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_second(per_second))),
            per_second,
        }
    }

    pub fn per_second(&self) -> u32 {
        self.per_second.get()
    }

    /// Wait until `action` may send another request
    pub async fn acquire(&self, action: &str) {
        let key = action.to_string();
        if self.limiter.check_key(&key).is_ok() {
            return;
        }

        tracing::debug!("Rate limited action {}, waiting for capacity", action);
        self.limiter.until_key_ready(&key).await;
    }

    /// Take capacity for `action` without waiting
    pub fn try_acquire(&self, action: &str) -> bool {
        self.limiter.check_key(&action.to_string()).is_ok()
    }
}
