//! # Onion Relay Subsystem
//!
//! Decodes the metadata envelope that carries an onion request between
//! relay hops and hands the payload to the request processor.
//!
//! ## Wire Format
//!
//! The envelope is a binary dictionary with keys in ascending order:
//!
//! | Key | Type | Required | Default |
//! |-----|------|----------|---------|
//! | `data` | bytes | yes | |
//! | `enc_type` | text tag | no | `aes-gcm` |
//! | `ephemeral_key` | 32 raw bytes | yes | |
//! | `hop_no` | integer | no | `1` (also the floor) |
//!
//! The codec is tolerant about `hop_no`; the upper bound
//! ([`MAX_ONION_HOPS`]) is enforced by [`OnionRelayHandler`] before the
//! request is forwarded.
//!
//! ## Module Structure
//!
//! ```text
//! domain/metadata.rs - EncType, OnionMetadata
//! domain/codec.rs    - encode_onion_data / decode_onion_data
//! ports.rs           - OnionRequestProcessor (driven port)
//! service.rs         - OnionRelayHandler
//! ```

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{decode_onion_data, encode_onion_data, EncType, OnionError, OnionMetadata};
pub use ports::OnionRequestProcessor;
pub use service::OnionRelayHandler;

/// Longest onion path a relay will forward.
pub const MAX_ONION_HOPS: i32 = 15;
