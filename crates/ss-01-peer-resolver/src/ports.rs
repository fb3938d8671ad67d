//! # Driven Ports (Outbound SPI)
//!
//! The peer table is owned by swarm membership, which lives outside this
//! crate.

use shared_types::{PeerRecord, X25519Pubkey};

/// Table of active service nodes, keyed by transport key.
///
/// # Thread Safety
///
/// Lookups happen concurrently from every gateway worker; implementations
/// must be safe for concurrent reads while membership updates land.
pub trait PeerTable: Send + Sync {
    /// The active peer with this transport key, if any.
    fn find_node(&self, pubkey: &X25519Pubkey) -> Option<PeerRecord>;
}
