//! # Driven Ports (Outbound SPI)

use bytes::Bytes;
use shared_types::ResponseReply;

use crate::domain::OnionMetadata;

/// Peels onion layers and either answers or relays to the next hop.
///
/// Decryption lives outside this crate. Implementations must return
/// promptly and complete `reply` exactly once, from any thread.
pub trait OnionRequestProcessor: Send + Sync {
    fn process_onion_req(&self, payload: Bytes, meta: OnionMetadata, reply: ResponseReply);
}
