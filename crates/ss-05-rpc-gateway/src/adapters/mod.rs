//! Adapters for the transport-facing authorization callback and the client
//! rate-limit capability.

pub mod auth;
pub mod rate_limit;

pub use auth::AuthorizedKeySet;
pub use rate_limit::GovernorRateLimiter;
