use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use thiserror::Error;

/// Why a storage test request was refused before reaching the executor.
///
/// The `Display` text is the reply sent to the requesting peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageTestRejection {
    #[error("unauthorized")]
    MissingTransportKey,

    #[error("invalid parameters")]
    InvalidParameters,

    #[error("invalid pubkey")]
    UnknownPeer,

    #[error("invalid height")]
    InvalidHeight,

    #[error("invalid msg hash")]
    InvalidMsgHash,
}

/// A validated audit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTestRequest {
    /// Block height, always > 0.
    pub height: u64,
    /// Identifier in its textual wire form.
    pub msg_hash: String,
}

impl StorageTestRequest {
    /// Validate the height and identifier parts.
    pub fn parse(height: &[u8], msg_id: &[u8]) -> Result<Self, StorageTestRejection> {
        let height = parse_height(height).ok_or(StorageTestRejection::InvalidHeight)?;
        let msg_hash = encode_msg_hash(msg_id).ok_or(StorageTestRejection::InvalidMsgHash)?;
        Ok(Self { height, msg_hash })
    }
}

fn parse_height(raw: &[u8]) -> Option<u64> {
    if raw.is_empty() || !raw.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let text = std::str::from_utf8(raw).ok()?;
    text.parse::<u64>().ok().filter(|h| *h > 0)
}

/// Textual form of a message identifier: hex for 64 bytes, unpadded
/// standard base64 for 32 bytes. Any other length has no textual form.
pub fn encode_msg_hash(raw: &[u8]) -> Option<String> {
    match raw.len() {
        64 => Some(hex::encode(raw)),
        32 => Some(STANDARD_NO_PAD.encode(raw)),
        _ => None,
    }
}
