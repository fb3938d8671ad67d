//! # Core Domain Entities
//!
//! Peer identities and the peer record shared by every subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: `X25519Pubkey` (transport key), `LegacyPubkey` (long-term key)
//! - **Networking**: `PeerRecord`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::errors::KeyError;

/// Size of every public key used by the swarm protocols.
pub const PUBKEY_SIZE: usize = 32;

macro_rules! fixed_key {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        pub struct $name(pub [u8; PUBKEY_SIZE]);

        impl $name {
            /// Wrap raw key bytes.
            pub const fn new(bytes: [u8; PUBKEY_SIZE]) -> Self {
                Self(bytes)
            }

            /// Build from a byte slice that must be exactly 32 bytes long.
            pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
                let raw: [u8; PUBKEY_SIZE] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
                    expected: PUBKEY_SIZE,
                    actual: bytes.len(),
                })?;
                Ok(Self(raw))
            }

            /// Parse from a 64-character hex string.
            pub fn from_hex(s: &str) -> Result<Self, KeyError> {
                let bytes = hex::decode(s).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
                Self::from_bytes(&bytes)
            }

            /// Raw key bytes.
            pub fn as_bytes(&self) -> &[u8; PUBKEY_SIZE] {
                &self.0
            }

            /// Lowercase hex encoding.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

fixed_key! {
    /// Transport-layer public key. Connections are authenticated with it and
    /// peers are looked up by it.
    X25519Pubkey
}

fixed_key! {
    /// Long-term service node identity key. Used for audit attribution and
    /// test-result logging, never for transport.
    LegacyPubkey
}

/// A known service node.
///
/// Immutable once built; swarm updates replace whole records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Public IP address.
    pub ip: IpAddr,
    /// Port of the peer's authenticated RPC listener.
    pub omq_port: u16,
    /// Port of the peer's HTTPS client listener.
    pub https_port: u16,
    /// Long-term identity key.
    pub pubkey_legacy: LegacyPubkey,
    /// Transport key.
    pub pubkey_x25519: X25519Pubkey,
}

impl PeerRecord {
    /// Address of the peer's RPC listener in transport URL form.
    pub fn omq_address(&self) -> String {
        match self.ip {
            IpAddr::V4(ip) => format!("tcp://{}:{}", ip, self.omq_port),
            IpAddr::V6(ip) => format!("tcp://[{}]:{}", ip, self.omq_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_key_from_bytes_checks_length() {
        assert!(X25519Pubkey::from_bytes(&[7u8; 32]).is_ok());
        assert_eq!(
            X25519Pubkey::from_bytes(&[7u8; 31]),
            Err(KeyError::InvalidLength {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn test_key_hex_roundtrip() {
        let key = LegacyPubkey::new([0xab; 32]);
        let parsed = LegacyPubkey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key, parsed);
        assert!(LegacyPubkey::from_hex("zz").is_err());
    }

    #[test]
    fn test_omq_address_format() {
        let peer = PeerRecord {
            ip: IpAddr::V4(Ipv4Addr::new(10, 1, 2, 3)),
            omq_port: 22020,
            https_port: 22021,
            pubkey_legacy: LegacyPubkey::default(),
            pubkey_x25519: X25519Pubkey::default(),
        };
        assert_eq!(peer.omq_address(), "tcp://10.1.2.3:22020");
    }
}
