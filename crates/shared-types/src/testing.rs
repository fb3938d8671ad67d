//! # Test Utilities
//!
//! In-memory transport double and message helpers. Requires feature: `test-utils`.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::connection::{ConnectionId, Route};
use crate::errors::TransportError;
use crate::message::{AuthLevel, ConnectionInfo, DeferredReply, Message};
use crate::transport::{ConnectionAuthorizer, RequestOptions, Transport};

/// A request the mock saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub route: Route,
    pub command: String,
    pub data: Vec<Bytes>,
    pub options: RequestOptions,
}

/// A one-way send the mock saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSend {
    pub route: Route,
    pub command: String,
    pub data: Vec<Bytes>,
}

/// Programmable transport.
pub struct MockTransport {
    next_conn: AtomicU64,
    connect_failures_left: AtomicU32,
    connect_attempts: AtomicU32,
    listen_result: Mutex<Result<(), TransportError>>,
    request_result: Mutex<Result<Vec<Bytes>, TransportError>>,
    hang_requests: AtomicBool,
    authorizer: Mutex<Option<Arc<dyn ConnectionAuthorizer>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    sends: Mutex<Vec<RecordedSend>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            next_conn: AtomicU64::new(1),
            connect_failures_left: AtomicU32::new(0),
            connect_attempts: AtomicU32::new(0),
            listen_result: Mutex::new(Ok(())),
            request_result: Mutex::new(Ok(vec![Bytes::from_static(b"pong")])),
            hang_requests: AtomicBool::new(false),
            authorizer: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
        }
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connect attempts.
    pub fn fail_connects(&self, n: u32) {
        self.connect_failures_left.store(n, Ordering::SeqCst);
    }

    /// Make every listen call return `result`.
    pub fn set_listen_result(&self, result: Result<(), TransportError>) {
        *self.listen_result.lock() = result;
    }

    /// Make every request return `result`.
    pub fn set_request_result(&self, result: Result<Vec<Bytes>, TransportError>) {
        *self.request_result.lock() = result;
    }

    /// Never complete requests, whatever timeout they carry.
    pub fn hang_requests(&self) {
        self.hang_requests.store(true, Ordering::SeqCst);
    }

    pub fn connect_attempts(&self) -> u32 {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    /// Authorizer passed to the last successful `listen`.
    pub fn authorizer(&self) -> Option<Arc<dyn ConnectionAuthorizer>> {
        self.authorizer.lock().clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect_remote(
        &self,
        address: &str,
        _auth: AuthLevel,
    ) -> Result<ConnectionId, TransportError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .connect_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::ConnectFailed(format!(
                "{} refused connection",
                address
            )));
        }
        Ok(ConnectionId(self.next_conn.fetch_add(1, Ordering::SeqCst)))
    }

    async fn listen(
        &self,
        _bind: &str,
        authorizer: Arc<dyn ConnectionAuthorizer>,
    ) -> Result<(), TransportError> {
        let result = self.listen_result.lock().clone();
        if result.is_ok() {
            *self.authorizer.lock() = Some(authorizer);
        }
        result
    }

    async fn request(
        &self,
        route: &Route,
        command: &str,
        data: Vec<Bytes>,
        options: RequestOptions,
    ) -> Result<Vec<Bytes>, TransportError> {
        self.requests.lock().push(RecordedRequest {
            route: route.clone(),
            command: command.to_string(),
            data,
            options,
        });
        if self.hang_requests.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.request_result.lock().clone()
    }

    fn send(&self, route: &Route, command: &str, data: Vec<Bytes>) -> Result<(), TransportError> {
        self.sends.lock().push(RecordedSend {
            route: route.clone(),
            command: command.to_string(),
            data,
        });
        Ok(())
    }
}

/// Connection metadata for tests.
pub fn test_connection(pubkey: &[u8], auth: AuthLevel, remote_sn: bool) -> ConnectionInfo {
    ConnectionInfo {
        id: ConnectionId(1),
        pubkey: Bytes::copy_from_slice(pubkey),
        remote: "203.0.113.7:40000".to_string(),
        auth,
        remote_sn,
    }
}

/// Build a message whose reply lands in the returned receiver.
pub fn capture_message<I, B>(
    conn: ConnectionInfo,
    data: I,
) -> (Message, oneshot::Receiver<Vec<Bytes>>)
where
    I: IntoIterator<Item = B>,
    B: Into<Bytes>,
{
    let (reply, rx) = DeferredReply::channel("test");
    let data = data.into_iter().map(Into::into).collect();
    (Message::new(conn, data, reply), rx)
}

/// Reply parts as UTF-8 strings, for readable assertions.
pub fn parts_as_strings(parts: &[Bytes]) -> Vec<String> {
    parts
        .iter()
        .map(|p| String::from_utf8_lossy(p).into_owned())
        .collect()
}
