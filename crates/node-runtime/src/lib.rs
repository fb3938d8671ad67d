//! # Node Runtime Library
//!
//! Wires the swarm subsystems into a running node.
//!
//! ## Modular Structure
//!
//! - `config` - TOML configuration with environment overrides
//! - `telemetry` - log subscriber setup
//! - `bootstrap` - ordered startup: daemon, initial sync, listener
//! - `runtime` - `NodeRuntime`, built from explicit collaborators
//!
//! ## Subsystems
//!
//! 1. Peer Resolver (ss-01) - transport key to peer record
//! 2. Onion Relay (ss-02) - onion payload decoding and hop limits
//! 3. Storage Test (ss-03) - storage audits from swarm peers
//! 4. Reachability (ss-04) - `sn.ping` probes
//! 5. RPC Gateway (ss-05) - categorized command dispatch

pub mod bootstrap;
pub mod config;
pub mod runtime;
pub mod telemetry;

pub use bootstrap::{BootstrapError, BootstrapSequencer, BootstrapStage, InitialSync, RetryPolicy};
pub use config::{ConfigError, LoggingConfig, NodeConfig};
pub use runtime::{NodeCollaborators, NodeRuntime};
pub use telemetry::init_logging;
