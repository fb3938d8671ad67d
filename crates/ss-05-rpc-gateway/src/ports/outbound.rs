//! Driven ports (outbound SPI).

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// How an inbound ping reached this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReachType {
    Https,
    Omq,
}

impl fmt::Display for ReachType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReachType::Https => write!(f, "https"),
            ReachType::Omq => write!(f, "omq"),
        }
    }
}

/// The local service node: storage, swarm membership and statistics.
pub trait SwarmNode: Send + Sync {
    /// Store a batch of messages pushed by a swarm peer.
    fn process_push_batch(&self, blob: Bytes);

    /// Note that a peer reached us.
    fn record_ping(&self, reach: ReachType);

    /// Operational statistics.
    fn stats(&self) -> serde_json::Value;

    /// Refresh swarm membership after a new block.
    fn update_swarms(&self);
}

/// Decides whether a direct client request is over its allowance.
pub trait ClientRateLimiter: Send + Sync {
    /// `true` when the request from `remote` must be refused.
    fn should_rate_limit_client(&self, remote: &str) -> bool;
}

/// Why a monitor subscription signature was refused. The `Display` text is
/// sent to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonitorAuthError {
    #[error("Signature verification failed: {0}")]
    InvalidSubkey(String),

    #[error("Signature verification failed")]
    BadSignature,
}

/// Signature checks for monitor subscriptions.
pub trait MonitorAuthenticator: Send + Sync {
    /// 33-byte account key (`0x05` prefixed) for a session Ed25519 key, or
    /// `None` if the key is not a valid Ed25519 point.
    fn derive_account(&self, ed25519: &[u8]) -> Option<Bytes>;

    /// Verify `signature` over `message` by `ed25519`, or by the key derived
    /// from it and `subkey` when one is given.
    fn verify(
        &self,
        ed25519: &[u8],
        subkey: Option<&[u8]>,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), MonitorAuthError>;
}
