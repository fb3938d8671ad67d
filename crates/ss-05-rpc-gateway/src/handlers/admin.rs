//! `service.get_stats` and `notify.block`.

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

use shared_types::Message;

use super::CommandHandler;
use crate::domain::GatewayStats;
use crate::ports::SwarmNode;

/// Node statistics with the gateway's dispatch counters under `gateway`.
pub struct StatsHandler {
    node: Arc<dyn SwarmNode>,
    stats: Arc<GatewayStats>,
}

impl StatsHandler {
    pub fn new(node: Arc<dyn SwarmNode>, stats: Arc<GatewayStats>) -> Self {
        Self { node, stats }
    }

    fn payload(&self) -> Value {
        let gateway = self.stats.to_json();
        match self.node.stats() {
            Value::Object(mut map) => {
                map.insert("gateway".to_string(), gateway);
                Value::Object(map)
            }
            other => json!({ "node": other, "gateway": gateway }),
        }
    }
}

impl CommandHandler for StatsHandler {
    fn handle(&self, message: Message) {
        debug!(remote = %message.conn.remote, "stats requested");
        let payload = self.payload().to_string();
        message.send_reply([payload]);
    }
}

/// New block from the local daemon: refresh swarm membership.
pub struct BlockNotifyHandler {
    node: Arc<dyn SwarmNode>,
}

impl BlockNotifyHandler {
    pub fn new(node: Arc<dyn SwarmNode>) -> Self {
        Self { node }
    }
}

impl CommandHandler for BlockNotifyHandler {
    fn handle(&self, message: Message) {
        info!("received new block notification");
        self.node.update_swarms();
        message.reply.reply_empty();
    }
}
