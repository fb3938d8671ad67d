//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use shared_types::MAX_MESSAGE_SIZE;

/// Main gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Largest accepted inbound message, all parts combined
    pub max_message_size: usize,
    /// Worker slots shared by every category
    pub general_workers: usize,
    /// Per-category reserved workers and queue depths
    pub categories: CategoryBudgets,
    /// How long a peer has to answer `sn.ping`
    pub ping_timeout_ms: u64,
    /// Direct client request limits
    pub rate_limit: RateLimitConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            general_workers: 1,
            categories: CategoryBudgets::default(),
            ping_timeout_ms: 5_000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_message_size cannot be 0".into(),
            ));
        }

        if self.general_workers == 0 {
            return Err(ConfigError::InvalidLimit(
                "general_workers cannot be 0".into(),
            ));
        }

        for (name, budget) in self.categories.iter() {
            if budget.max_queue == 0 {
                return Err(ConfigError::InvalidLimit(format!(
                    "categories.{}.max_queue cannot be 0",
                    name
                )));
            }
        }

        if self.ping_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "ping_timeout_ms cannot be 0".into(),
            ));
        }

        if self.rate_limit.enabled
            && (self.rate_limit.requests_per_second == 0 || self.rate_limit.burst_size == 0)
        {
            return Err(ConfigError::InvalidRateLimit(
                "requests_per_second and burst_size must be non-zero".into(),
            ));
        }

        Ok(())
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

/// Reserved workers and queue depth for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBudget {
    /// Workers only this category may use
    pub reserved_threads: usize,
    /// Pending requests beyond which new ones are refused
    pub max_queue: usize,
}

impl CategoryBudget {
    pub const fn new(reserved_threads: usize, max_queue: usize) -> Self {
        Self {
            reserved_threads,
            max_queue,
        }
    }
}

/// Budgets for every category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryBudgets {
    pub sn: CategoryBudget,
    pub storage: CategoryBudget,
    pub monitor: CategoryBudget,
    pub service: CategoryBudget,
    pub notify: CategoryBudget,
}

impl Default for CategoryBudgets {
    fn default() -> Self {
        Self {
            sn: CategoryBudget::new(2, 1000),
            storage: CategoryBudget::new(1, 200),
            monitor: CategoryBudget::new(1, 500),
            service: CategoryBudget::new(0, 200),
            notify: CategoryBudget::new(0, 200),
        }
    }
}

impl CategoryBudgets {
    /// `(category, budget)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, CategoryBudget)> {
        [
            ("sn", self.sn),
            ("storage", self.storage),
            ("monitor", self.monitor),
            ("service", self.service),
            ("notify", self.notify),
        ]
        .into_iter()
    }
}

/// Rate limit configuration for direct client requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Sustained requests per second per client address
    pub requests_per_second: u32,
    /// Burst allowance
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 100,
            burst_size: 200,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid rate limit: {0}")]
    InvalidRateLimit(String),
}
