//! Client storage requests: direct (`storage.<method>`) and forwarded by a
//! swarm peer (`sn.storage_cc`).
//!
//! A direct request carries at most one part, the request body. A forwarded
//! request carries exactly two: the method name and the body. `OK` replies
//! collapse to the body alone; any other status is sent as `(status, body)`.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use shared_types::{Message, Response, ResponseReply, StatusCode};

use super::CommandHandler;
use crate::ports::ClientRateLimiter;

/// Method names served when the endpoint table is built from a single
/// request handler.
pub const DEFAULT_CLIENT_METHODS: [&str; 11] = [
    "store",
    "retrieve",
    "info",
    "delete",
    "delete_all",
    "delete_before",
    "expire_all",
    "expire",
    "get_swarm",
    "get_snodes_for_pubkey",
    "oxend_request",
];

/// Serves one client method.
pub trait ClientEndpoint: Send + Sync {
    /// `params` is the request body (empty if none was sent). `reply` must be
    /// completed exactly once.
    fn call(&self, params: Bytes, forwarded: bool, reply: ResponseReply);
}

impl<F> ClientEndpoint for F
where
    F: Fn(Bytes, bool, ResponseReply) + Send + Sync,
{
    fn call(&self, params: Bytes, forwarded: bool, reply: ResponseReply) {
        self(params, forwarded, reply)
    }
}

/// Client request processing keyed by method name.
pub trait ClientRequestHandler: Send + Sync {
    fn process_client_req(&self, method: &str, params: Bytes, forwarded: bool, reply: ResponseReply);
}

struct MethodEndpoint {
    method: &'static str,
    handler: Arc<dyn ClientRequestHandler>,
}

impl ClientEndpoint for MethodEndpoint {
    fn call(&self, params: Bytes, forwarded: bool, reply: ResponseReply) {
        self.handler
            .process_client_req(self.method, params, forwarded, reply);
    }
}

/// Name → endpoint table. Immutable once handed to the gateway.
#[derive(Clone, Default)]
pub struct ClientEndpointTable {
    endpoints: BTreeMap<String, Arc<dyn ClientEndpoint>>,
}

impl ClientEndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every default method, all served by `handler`.
    pub fn with_default_methods(handler: Arc<dyn ClientRequestHandler>) -> Self {
        let mut table = Self::new();
        for method in DEFAULT_CLIENT_METHODS {
            table.insert(
                method,
                Arc::new(MethodEndpoint {
                    method,
                    handler: handler.clone(),
                }),
            );
        }
        table
    }

    pub fn insert(&mut self, name: impl Into<String>, endpoint: Arc<dyn ClientEndpoint>) {
        self.endpoints.insert(name.into(), endpoint);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ClientEndpoint>> {
        self.endpoints.get(name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ClientEndpoint>)> {
        self.endpoints.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// `Invalid request: expected N message parts, received M`.
fn part_count_error(expected: usize, received: usize) -> Response {
    Response::bad_request(format!(
        "Invalid request: expected {} message parts, received {}",
        expected, received
    ))
}

/// `storage.<method>`: a client request sent straight to this node.
pub struct ClientMethodHandler {
    method: String,
    endpoint: Arc<dyn ClientEndpoint>,
    rate_limiter: Arc<dyn ClientRateLimiter>,
}

impl ClientMethodHandler {
    pub fn new(
        method: impl Into<String>,
        endpoint: Arc<dyn ClientEndpoint>,
        rate_limiter: Arc<dyn ClientRateLimiter>,
    ) -> Self {
        Self {
            method: method.into(),
            endpoint,
            rate_limiter,
        }
    }
}

impl CommandHandler for ClientMethodHandler {
    fn handle(&self, message: Message) {
        let Message { conn, mut data, reply } = message;

        if self.rate_limiter.should_rate_limit_client(&conn.remote) {
            debug!(remote = %conn.remote, method = %self.method, "rate limiting client request");
            return reply.reply_response(
                Response::new(StatusCode::TOO_MANY_REQUESTS, "too many requests"),
                false,
            );
        }

        if data.len() > 1 {
            warn!(method = %self.method, parts = data.len(), "invalid client request");
            return reply.reply_response(part_count_error(1, data.len()), false);
        }

        let params = data.pop().unwrap_or_default();
        debug!(method = %self.method, remote = %conn.remote, "handling client request");
        self.endpoint
            .call(params, false, reply.into_response_reply(true));
    }
}

/// `sn.storage_cc`: a client request relayed by a swarm peer.
pub struct ForwardedClientHandler {
    endpoints: ClientEndpointTable,
}

impl ForwardedClientHandler {
    pub fn new(endpoints: ClientEndpointTable) -> Self {
        Self { endpoints }
    }
}

impl CommandHandler for ForwardedClientHandler {
    fn handle(&self, message: Message) {
        let Message { conn, data, reply } = message;

        if data.len() != 2 {
            warn!(remote = %conn.remote, parts = data.len(), "invalid forwarded client request");
            return reply.reply_response(part_count_error(2, data.len()), false);
        }

        let method = String::from_utf8_lossy(&data[0]);
        let Some(endpoint) = self.endpoints.get(&method) else {
            warn!(remote = %conn.remote, method = %method, "forwarded request for unknown method");
            return reply.reply_response(Response::bad_request("unknown method"), false);
        };

        debug!(method = %method, remote = %conn.remote, "handling forwarded client request");
        endpoint.call(data[1].clone(), true, reply.into_response_reply(true));
    }
}
