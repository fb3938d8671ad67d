//! # Transport Port
//!
//! The authenticated, encrypted, framed transport is an external collaborator.
//! This is the contract the node requires from it: outbound connect, listener
//! bind with a per-connection authorization callback, request/response with a
//! timeout, and one-way sends.
//!
//! Inbound delivery goes the other way: the transport hands each
//! `category.command` message to the RPC gateway.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

use crate::connection::{ConnectionId, Route};
use crate::errors::TransportError;
use crate::message::AuthLevel;

/// Options for an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// How long to wait for the reply.
    pub timeout: Duration,
    /// Only use an existing or new outgoing connection; never reuse an
    /// incoming connection from the peer.
    pub outgoing_only: bool,
}

impl RequestOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            outgoing_only: false,
        }
    }

    pub fn outgoing_only(mut self) -> Self {
        self.outgoing_only = true;
        self
    }
}

/// Decides a connection's authorization once, when it is accepted.
pub trait ConnectionAuthorizer: Send + Sync {
    fn authorize(&self, remote: &str, pubkey: &[u8], remote_sn: bool) -> AuthLevel;
}

/// Underlying transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open an outbound connection, resolving once it is established or failed.
    async fn connect_remote(
        &self,
        address: &str,
        auth: AuthLevel,
    ) -> Result<ConnectionId, TransportError>;

    /// Bind the public listener. Resolves once the bind succeeded or failed.
    async fn listen(
        &self,
        bind: &str,
        authorizer: Arc<dyn ConnectionAuthorizer>,
    ) -> Result<(), TransportError>;

    /// Send a request and wait for its reply parts.
    async fn request(
        &self,
        route: &Route,
        command: &str,
        data: Vec<Bytes>,
        options: RequestOptions,
    ) -> Result<Vec<Bytes>, TransportError>;

    /// Fire-and-forget send.
    fn send(&self, route: &Route, command: &str, data: Vec<Bytes>) -> Result<(), TransportError>;
}
