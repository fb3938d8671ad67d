//! # Wire Messages and Reply Continuations
//!
//! An inbound request is a [`Message`]: the connection it arrived on, its data
//! parts, and a one-shot [`DeferredReply`].
//!
//! ## Exactly-once replies
//!
//! [`Continuation::complete`] takes `self`, so a continuation cannot be invoked
//! twice; the compiler rejects it. A continuation dropped without being invoked
//! logs an error: every handler exit path must reply.

use bytes::Bytes;
use std::fmt;
use tokio::sync::oneshot;
use tracing::error;

use crate::connection::ConnectionId;
use crate::response::Response;

/// One-shot completion capability. May be moved to and completed from any thread.
pub struct Continuation<T: Send + 'static> {
    label: &'static str,
    callback: Option<Box<dyn FnOnce(T) + Send>>,
}

impl<T: Send + 'static> Continuation<T> {
    /// Wrap a callback. `label` names the continuation in logs.
    pub fn new(label: &'static str, callback: impl FnOnce(T) + Send + 'static) -> Self {
        Self {
            label,
            callback: Some(Box::new(callback)),
        }
    }

    /// Continuation that forwards its value into a oneshot channel.
    pub fn channel(label: &'static str) -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        let continuation = Self::new(label, move |value| {
            // Receiver gone means the requester stopped waiting; nothing to do.
            let _ = tx.send(value);
        });
        (continuation, rx)
    }

    /// Invoke the continuation. Consumes it.
    pub fn complete(mut self, value: T) {
        if let Some(callback) = self.callback.take() {
            callback(value);
        }
    }

    /// Adapt to a continuation taking `U`, converting through `f`.
    pub fn map<U: Send + 'static>(
        mut self,
        f: impl FnOnce(U) -> T + Send + 'static,
    ) -> Continuation<U> {
        let label = self.label;
        let callback = self.callback.take();
        Continuation::new(label, move |value| {
            if let Some(callback) = callback {
                callback(f(value));
            }
        })
    }

    /// Name used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<T: Send + 'static> Drop for Continuation<T> {
    fn drop(&mut self) {
        if self.callback.is_some() {
            error!(
                continuation = self.label,
                "reply continuation dropped without being invoked"
            );
        }
    }
}

impl<T: Send + 'static> fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("label", &self.label)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Deferred multi-part reply to an inbound message.
pub type DeferredReply = Continuation<Vec<Bytes>>;

/// Deferred `(status, body)` reply handed to request processors.
pub type ResponseReply = Continuation<Response>;

impl Continuation<Vec<Bytes>> {
    /// Send a reply made of the given parts.
    pub fn reply<I, B>(self, parts: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.complete(parts.into_iter().map(Into::into).collect());
    }

    /// Send a reply with no parts.
    pub fn reply_empty(self) {
        self.complete(Vec::new());
    }

    /// Send a response, optionally collapsing `OK` to a single body part.
    pub fn reply_response(self, response: Response, omit_ok: bool) {
        self.complete(response.into_parts(omit_ok));
    }

    /// Turn this reply into a response continuation.
    pub fn into_response_reply(self, omit_ok: bool) -> ResponseReply {
        self.map(move |response: Response| response.into_parts(omit_ok))
    }
}

/// Authorization level of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AuthLevel {
    /// No authorization: any client.
    #[default]
    None,
    /// Authenticated but unprivileged.
    Basic,
    /// Operator / trusted local daemon.
    Admin,
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthLevel::None => write!(f, "none"),
            AuthLevel::Basic => write!(f, "basic"),
            AuthLevel::Admin => write!(f, "admin"),
        }
    }
}

/// What the transport knows about the connection a message arrived on.
///
/// Authorization is fixed when the connection is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Transport connection id.
    pub id: ConnectionId,
    /// Raw transport key presented by the remote; empty if none.
    pub pubkey: Bytes,
    /// Remote address, for logs and rate limiting.
    pub remote: String,
    /// Authorization granted at accept time.
    pub auth: AuthLevel,
    /// Whether the remote authenticated as an active service node.
    pub remote_sn: bool,
}

/// An inbound request.
#[derive(Debug)]
pub struct Message {
    pub conn: ConnectionInfo,
    pub data: Vec<Bytes>,
    pub reply: DeferredReply,
}

impl Message {
    pub fn new(conn: ConnectionInfo, data: Vec<Bytes>, reply: DeferredReply) -> Self {
        Self { conn, data, reply }
    }

    /// Reply immediately.
    pub fn send_reply<I, B>(self, parts: I)
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.reply.reply(parts);
    }

    /// Total payload size across all parts.
    pub fn size(&self) -> usize {
        self.data.iter().map(Bytes::len).sum()
    }
}
