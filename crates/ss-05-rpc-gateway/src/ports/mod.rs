//! # Ports
//!
//! Collaborators the gateway calls into. Their implementations (storage
//! engine, swarm membership, signature crypto) live outside this workspace.

pub mod outbound;

pub use outbound::{ClientRateLimiter, MonitorAuthError, MonitorAuthenticator, ReachType, SwarmNode};
