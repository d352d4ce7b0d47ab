/// Sliding-window rate limiting
///
/// A [`RateLimiter`] counts requests per `scope:client` key in a primary
/// [`RateLimitStore`]. If the primary store errors, the hit is counted in an
/// in-process [`MemoryStore`] instead and a warning is logged, so a database
/// outage degrades limits to per-process rather than switching them off.

mod middleware;
mod store;

pub use middleware::{API_SCOPE, LOGIN_SCOPE, api_rate_limit, client_key, login_rate_limit};
pub use store::{DatabaseStore, MemoryStore, RateLimitStore};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::config::RateLimitPolicy;

/// The outcome of counting one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// Seconds the client should wait; zero when allowed
    pub retry_after_secs: u64,
}

pub struct RateLimiter {
    primary: Arc<dyn RateLimitStore>,
    fallback: MemoryStore,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(primary: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self {
            primary,
            fallback: MemoryStore::new(),
            policy,
        }
    }

    /// A limiter that only ever counts in process memory
    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(Arc::new(MemoryStore::new()), policy)
    }

    /// Counts a request from `client` under `scope` and decides whether it may proceed
    pub fn check(&self, scope: &str, client: &str) -> RateLimitDecision {
        self.check_at(scope, client, Utc::now())
    }

    pub fn check_at(&self, scope: &str, client: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let key = format!("{}:{}", scope, client);
        let window = self.policy.window();

        let count = match self.primary.hit(&key, now, window) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, key = %key, "Rate limit store failed, counting in memory");
                self.fallback.record(&key, now, window)
            }
        };

        let allowed = count <= self.policy.max_requests;
        RateLimitDecision {
            allowed,
            remaining: self.policy.max_requests.saturating_sub(count),
            retry_after_secs: if allowed { 0 } else { self.policy.window_secs },
        }
    }

    /// Drops expired hits from both stores and returns how many were dropped
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let window = self.policy.window();
        let primary = match self.primary.purge_expired(now, window) {
            Ok(purged) => purged,
            Err(e) => {
                warn!(error = %e, "Failed to purge rate limit store");
                0
            }
        };
        primary + self.fallback.purge_expired(now, window).unwrap_or(0)
    }
}
