//! # In-Memory Peer Table

use parking_lot::RwLock;
use std::collections::HashMap;

use shared_types::{PeerRecord, X25519Pubkey};

use crate::ports::PeerTable;

/// Peer table backed by a read-write locked map.
#[derive(Debug, Default)]
pub struct InMemoryPeerTable {
    peers: RwLock<HashMap<X25519Pubkey, PeerRecord>>,
}

impl InMemoryPeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table holding `records`.
    pub fn with_peers(records: impl IntoIterator<Item = PeerRecord>) -> Self {
        let table = Self::new();
        table.replace_all(records);
        table
    }

    /// Replace the whole membership, as a swarm update does.
    pub fn replace_all(&self, records: impl IntoIterator<Item = PeerRecord>) {
        let fresh: HashMap<_, _> = records
            .into_iter()
            .map(|r| (r.pubkey_x25519, r))
            .collect();
        *self.peers.write() = fresh;
    }

    pub fn insert(&self, record: PeerRecord) {
        self.peers.write().insert(record.pubkey_x25519, record);
    }

    pub fn remove(&self, pubkey: &X25519Pubkey) -> Option<PeerRecord> {
        self.peers.write().remove(pubkey)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

impl PeerTable for InMemoryPeerTable {
    fn find_node(&self, pubkey: &X25519Pubkey) -> Option<PeerRecord> {
        self.peers.read().get(pubkey).cloned()
    }
}
