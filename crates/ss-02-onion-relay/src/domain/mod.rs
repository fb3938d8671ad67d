//! Onion domain types and codec.

mod codec;
mod metadata;

pub use codec::{decode_onion_data, encode_onion_data, OnionError};
pub use metadata::{EncType, OnionMetadata};
