//! `sn.data` and `sn.ping`.

use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, trace};

use shared_types::Message;

use super::CommandHandler;
use crate::ports::{ReachType, SwarmNode};

/// Accepts a batch of messages pushed by a swarm peer.
pub struct PushDataHandler {
    node: Arc<dyn SwarmNode>,
}

impl PushDataHandler {
    pub fn new(node: Arc<dyn SwarmNode>) -> Self {
        Self { node }
    }
}

impl CommandHandler for PushDataHandler {
    fn handle(&self, message: Message) {
        let Message { conn, data, reply } = message;
        let mut blob = BytesMut::with_capacity(data.iter().map(Bytes::len).sum());
        for part in &data {
            blob.extend_from_slice(part);
        }
        debug!(remote = %conn.remote, size = blob.len(), "received push batch");
        self.node.process_push_batch(blob.freeze());
        reply.reply_empty();
    }
}

pub struct PingHandler {
    node: Arc<dyn SwarmNode>,
}

impl PingHandler {
    pub fn new(node: Arc<dyn SwarmNode>) -> Self {
        Self { node }
    }
}

impl CommandHandler for PingHandler {
    fn handle(&self, message: Message) {
        trace!(remote = %message.conn.remote, "received ping");
        self.node.record_ping(ReachType::Omq);
        message.send_reply(["pong"]);
    }
}
