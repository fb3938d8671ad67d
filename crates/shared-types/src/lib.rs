//! # Shared Types Crate
//!
//! This crate contains the peer identities, the wire message model, the
//! one-shot reply continuation and the binary dictionary codec used by every
//! swarm subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Exactly-once replies**: Reply continuations are consumed on use.
//! - **Ports, not implementations**: The transport is a trait; concrete
//!   transports live outside this workspace.

pub mod bt;
pub mod connection;
pub mod entities;
pub mod errors;
pub mod message;
pub mod response;
pub mod transport;

/// Test doubles.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use connection::{ConnectionHandle, ConnectionId, PeerAddressLookup, Route};
pub use entities::*;
pub use errors::*;
pub use message::{
    AuthLevel, ConnectionInfo, Continuation, DeferredReply, Message, ResponseReply,
};
pub use response::{Body, Response, StatusCode};
pub use transport::{ConnectionAuthorizer, RequestOptions, Transport};

pub use bytes::Bytes;

/// Maximum accepted inbound message size (10 MiB).
pub const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;
