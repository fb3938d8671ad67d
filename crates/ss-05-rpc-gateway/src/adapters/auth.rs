//! Listener authorization.
//!
//! Evaluated once per accepted connection: a connection presenting one of
//! the configured operator keys gets admin authorization, everyone else gets
//! none.

use std::collections::HashSet;
use tracing::info;

use shared_types::{AuthLevel, ConnectionAuthorizer, KeyError, X25519Pubkey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorizedKeySet {
    keys: HashSet<X25519Pubkey>,
}

impl AuthorizedKeySet {
    pub fn new(keys: impl IntoIterator<Item = X25519Pubkey>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Parse hex-encoded keys, failing on the first malformed one.
    pub fn from_hex<I, S>(keys: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| X25519Pubkey::from_hex(k.as_ref()))
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(Self { keys })
    }

    /// Whether a raw transport key is in the set.
    pub fn contains(&self, pubkey: &[u8]) -> bool {
        X25519Pubkey::from_bytes(pubkey).map_or(false, |key| self.keys.contains(&key))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl ConnectionAuthorizer for AuthorizedKeySet {
    fn authorize(&self, remote: &str, pubkey: &[u8], _remote_sn: bool) -> AuthLevel {
        if self.contains(pubkey) {
            info!(remote, pubkey = %hex::encode(pubkey), "granting admin access");
            AuthLevel::Admin
        } else {
            AuthLevel::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorized_key_gets_admin() {
        let set = AuthorizedKeySet::new([X25519Pubkey::new([4; 32])]);
        assert_eq!(set.authorize("10.0.0.1:1", &[4; 32], false), AuthLevel::Admin);
        assert_eq!(set.authorize("10.0.0.1:1", &[5; 32], true), AuthLevel::None);
        assert_eq!(set.authorize("10.0.0.1:1", &[], false), AuthLevel::None);
    }

    #[test]
    fn test_from_hex() {
        let set = AuthorizedKeySet::from_hex([hex::encode([4u8; 32])]).unwrap();
        assert!(set.contains(&[4; 32]));
        assert_eq!(set.len(), 1);

        assert!(AuthorizedKeySet::from_hex(["abcd"]).is_err());
        assert!(AuthorizedKeySet::from_hex(["zz"]).is_err());
    }
}
