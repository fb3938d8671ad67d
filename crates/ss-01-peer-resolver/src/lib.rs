//! # Peer Address Resolver
//!
//! Maps a service node's transport key to the address of its RPC listener.
//!
//! ## Architecture
//!
//! - **Ports Layer:** [`PeerTable`], the externally owned table of active peers
//! - **Service Layer:** [`PeerResolver`], key → record / address lookups
//! - **Adapters Layer:** [`InMemoryPeerTable`], a lock-protected table that swarm
//!   updates replace wholesale
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ss_01_peer_resolver::{InMemoryPeerTable, PeerResolver};
//!
//! let table = Arc::new(InMemoryPeerTable::new());
//! let resolver = PeerResolver::new(table);
//! assert!(resolver.peer_lookup(&[0u8; 32]).is_none());
//! ```

pub mod adapters;
pub mod ports;
pub mod service;

pub use adapters::InMemoryPeerTable;
pub use ports::PeerTable;
pub use service::PeerResolver;
