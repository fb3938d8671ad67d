//! Gateway domain: configuration, errors, category access rules and counters.

pub mod access;
pub mod config;
pub mod error;
pub mod stats;

pub use access::{Access, CATEGORY_MONITOR, CATEGORY_NOTIFY, CATEGORY_SERVICE, CATEGORY_SN, CATEGORY_STORAGE};
pub use config::{CategoryBudget, CategoryBudgets, ConfigError, GatewayConfig, RateLimitConfig};
pub use error::GatewayError;
pub use stats::{CategoryCounters, GatewayStats};
