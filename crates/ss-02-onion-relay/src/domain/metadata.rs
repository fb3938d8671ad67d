use std::fmt;
use std::str::FromStr;

use shared_types::X25519Pubkey;

use super::codec::OnionError;

/// Symmetric cipher the client used for the onion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EncType {
    #[default]
    AesGcm,
    AesCbc,
    XChaCha20,
}

impl EncType {
    /// Canonical wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EncType::AesGcm => "aes-gcm",
            EncType::AesCbc => "aes-cbc",
            EncType::XChaCha20 => "xchacha20",
        }
    }
}

impl FromStr for EncType {
    type Err = OnionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-gcm" | "gcm" => Ok(EncType::AesGcm),
            "aes-cbc" | "cbc" => Ok(EncType::AesCbc),
            "xchacha20" | "xchacha20-poly1305" => Ok(EncType::XChaCha20),
            other => Err(OnionError::UnknownEncType(other.to_string())),
        }
    }
}

impl fmt::Display for EncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing metadata carried alongside an onion payload.
///
/// The reply continuation travels separately so this stays a plain value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnionMetadata {
    /// Client's ephemeral key for this layer.
    pub ephemeral_key: X25519Pubkey,
    pub enc_type: EncType,
    /// Hops traversed so far, at least 1 once decoded.
    pub hop_no: i32,
}

impl OnionMetadata {
    pub fn new(ephemeral_key: X25519Pubkey, enc_type: EncType, hop_no: i32) -> Self {
        Self {
            ephemeral_key,
            enc_type,
            hop_no,
        }
    }

    /// Metadata for the next relay hop.
    pub fn next_hop(&self) -> Self {
        Self {
            hop_no: self.hop_no.saturating_add(1),
            ..*self
        }
    }
}
