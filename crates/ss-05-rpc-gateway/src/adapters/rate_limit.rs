//! Per-address token bucket limiting for direct client requests.

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use tracing::debug;

use crate::domain::RateLimitConfig;
use crate::ports::ClientRateLimiter;

pub struct GovernorRateLimiter {
    enabled: bool,
    limiter: DefaultKeyedRateLimiter<String>,
}

impl GovernorRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            enabled: config.enabled,
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Forget idle clients.
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
    }
}

/// Clients are keyed by IP; the source port changes per connection.
fn client_key(remote: &str) -> String {
    remote
        .parse::<SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| remote.to_string())
}

impl ClientRateLimiter for GovernorRateLimiter {
    fn should_rate_limit_client(&self, remote: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let key = client_key(remote);
        let limited = self.limiter.check_key(&key).is_err();
        if limited {
            debug!(client = %key, "client over rate limit");
        }
        limited
    }
}
