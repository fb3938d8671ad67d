//! # Peer Resolver Service

use std::sync::Arc;
use tracing::{debug, trace};

use shared_types::{PeerAddressLookup, PeerRecord, X25519Pubkey};

use crate::ports::PeerTable;

/// Resolves transport keys against the peer table.
#[derive(Clone)]
pub struct PeerResolver {
    table: Arc<dyn PeerTable>,
}

impl PeerResolver {
    pub fn new(table: Arc<dyn PeerTable>) -> Self {
        Self { table }
    }

    /// Active peer for a transport key.
    pub fn find_node(&self, pubkey: &X25519Pubkey) -> Option<PeerRecord> {
        self.table.find_node(pubkey)
    }

    /// Active peer for a raw key as presented by the transport. Keys of the
    /// wrong size never match.
    pub fn find_node_raw(&self, pubkey_bin: &[u8]) -> Option<PeerRecord> {
        let pubkey = X25519Pubkey::from_bytes(pubkey_bin).ok()?;
        self.find_node(&pubkey)
    }

    /// Address of the peer's RPC listener, e.g. `tcp://1.2.3.4:22020`.
    pub fn peer_lookup(&self, pubkey_bin: &[u8]) -> Option<String> {
        trace!("peer lookup");
        let pubkey = X25519Pubkey::from_bytes(pubkey_bin).ok()?;
        match self.find_node(&pubkey) {
            Some(record) => Some(record.omq_address()),
            None => {
                debug!(pubkey = %pubkey, "peer node not found via x25519 pubkey");
                None
            }
        }
    }
}

impl PeerAddressLookup for PeerResolver {
    fn lookup_address(&self, pubkey: &X25519Pubkey) -> Option<String> {
        self.peer_lookup(pubkey.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryPeerTable;
    use shared_types::LegacyPubkey;
    use std::net::{IpAddr, Ipv4Addr};

    fn record(seed: u8, port: u16) -> PeerRecord {
        PeerRecord {
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, seed)),
            omq_port: port,
            https_port: port + 1,
            pubkey_legacy: LegacyPubkey::new([seed.wrapping_add(100); 32]),
            pubkey_x25519: X25519Pubkey::new([seed; 32]),
        }
    }

    fn resolver_with(records: Vec<PeerRecord>) -> (Arc<InMemoryPeerTable>, PeerResolver) {
        let table = Arc::new(InMemoryPeerTable::with_peers(records));
        let resolver = PeerResolver::new(table.clone());
        (table, resolver)
    }

    #[test]
    fn test_lookup_known_peer() {
        let (_, resolver) = resolver_with(vec![record(1, 22020)]);
        assert_eq!(
            resolver.peer_lookup(&[1u8; 32]),
            Some("tcp://10.0.0.1:22020".to_string())
        );
    }

    #[test]
    fn test_lookup_unknown_peer() {
        let (_, resolver) = resolver_with(vec![record(1, 22020)]);
        assert_eq!(resolver.peer_lookup(&[2u8; 32]), None);
    }

    #[test]
    fn test_lookup_wrong_key_size() {
        let (_, resolver) = resolver_with(vec![record(1, 22020)]);
        assert_eq!(resolver.peer_lookup(&[1u8; 31]), None);
        assert_eq!(resolver.peer_lookup(&[]), None);
        assert!(resolver.find_node_raw(&[1u8; 33]).is_none());
    }

    #[test]
    fn test_membership_update_is_visible() {
        let (table, resolver) = resolver_with(vec![record(1, 22020)]);
        table.replace_all(vec![record(2, 30000)]);

        assert_eq!(resolver.peer_lookup(&[1u8; 32]), None);
        assert_eq!(
            resolver.lookup_address(&X25519Pubkey::new([2; 32])),
            Some("tcp://10.0.0.2:30000".to_string())
        );
    }

    #[test]
    fn test_concurrent_lookups() {
        let (_, resolver) = resolver_with((1..=20).map(|i| record(i, 20000)).collect());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || {
                    (1..=20u8)
                        .filter(|i| resolver.peer_lookup(&[*i; 32]).is_some())
                        .count()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 20);
        }
    }
}
