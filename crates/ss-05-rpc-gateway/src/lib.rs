//! # RPC Gateway Subsystem
//!
//! Node-to-node command dispatch for a swarm storage node.
//!
//! ## Categories
//!
//! | Category | Access | Reserved / Queue | Commands |
//! |----------|--------|------------------|----------|
//! | `sn` | service nodes only | 2 / 1000 | `data`, `ping`, `storage_test`, `onion_request`, `storage_cc` |
//! | `storage` | public | 1 / 200 | one per client method |
//! | `monitor` | public | 1 / 500 | `messages` |
//! | `service` | admin | 0 / 200 | `get_stats` |
//! | `notify` | admin | 0 / 200 | `block` |
//!
//! ## Reply Convention
//!
//! A successful client reply is the body alone; anything else is
//! `(status, body)` with the status as decimal text. Gateway refusals
//! (unknown command, access, size, full queue) are always two parts.
//!
//! ## Module Structure
//!
//! ```text
//! domain/    - config, errors, access rules, counters
//! gateway/   - RpcGateway, builder, worker pool
//! handlers/  - one handler per command
//! monitor/   - subscriptions and notification fan-out
//! ports/     - SwarmNode, ClientRateLimiter, MonitorAuthenticator
//! adapters/  - AuthorizedKeySet, GovernorRateLimiter
//! service.rs - the full swarm command set
//! ```

pub mod adapters;
pub mod domain;
pub mod gateway;
pub mod handlers;
pub mod monitor;
pub mod ports;
pub mod service;

pub use adapters::{AuthorizedKeySet, GovernorRateLimiter};
pub use domain::{
    Access, CategoryBudget, CategoryBudgets, ConfigError, GatewayConfig, GatewayError,
    GatewayStats, RateLimitConfig,
};
pub use gateway::{RpcGateway, RpcGatewayBuilder};
pub use handlers::{
    ClientEndpoint, ClientEndpointTable, ClientRequestHandler, CommandHandler,
    DEFAULT_CLIENT_METHODS,
};
pub use monitor::{MonitorFanout, MonitorRegistry, StoredMessage};
pub use ports::{ClientRateLimiter, MonitorAuthError, MonitorAuthenticator, ReachType, SwarmNode};
pub use service::{build_swarm_gateway, SwarmServices};
