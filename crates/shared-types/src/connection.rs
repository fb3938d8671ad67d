//! # Connection Handles
//!
//! Subscribers can be reached either over the transport connection they came
//! in on or by addressing a peer's transport key. Fan-out code only needs a
//! [`Route`]; how the subscriber connected is hidden behind [`ConnectionHandle`].

use std::fmt;

use crate::entities::X25519Pubkey;

/// Opaque id the transport assigns to a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Where an outbound send or request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// An existing transport connection.
    Connection(ConnectionId),
    /// A peer, by transport key, at a resolved address.
    Peer {
        pubkey: X25519Pubkey,
        address: String,
    },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Connection(id) => write!(f, "{}", id),
            Route::Peer { pubkey, address } => write!(f, "{}@{}", pubkey, address),
        }
    }
}

/// Resolves a peer transport key to a reachable address.
pub trait PeerAddressLookup: Send + Sync {
    /// Address for `pubkey`, or `None` if the peer is unknown.
    fn lookup_address(&self, pubkey: &X25519Pubkey) -> Option<String>;
}

/// A subscriber's connection, however it connected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConnectionHandle {
    /// Raw transport connection id.
    Transport(ConnectionId),
    /// Peer-identity-addressed route.
    Peer(X25519Pubkey),
}

impl ConnectionHandle {
    /// Resolve to a sendable route. `None` is a normal outcome (peer left the
    /// network, unknown key) and callers skip the subscriber.
    pub fn resolve(&self, lookup: &dyn PeerAddressLookup) -> Option<Route> {
        match self {
            ConnectionHandle::Transport(id) => Some(Route::Connection(*id)),
            ConnectionHandle::Peer(pubkey) => lookup
                .lookup_address(pubkey)
                .map(|address| Route::Peer {
                    pubkey: *pubkey,
                    address,
                }),
        }
    }
}
