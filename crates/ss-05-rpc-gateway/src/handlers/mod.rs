//! # Command Handlers
//!
//! One handler per `category.command`. Every handler replies exactly once,
//! either before returning or by handing the reply continuation to a
//! collaborator that completes it later.

pub mod admin;
pub mod client;
pub mod monitor;
pub mod peer;

use shared_types::Message;
use ss_02_onion_relay::OnionRelayHandler;
use ss_03_storage_test::StorageTestHandler;

pub use admin::{BlockNotifyHandler, StatsHandler};
pub use client::{
    ClientEndpoint, ClientEndpointTable, ClientMethodHandler, ClientRequestHandler,
    ForwardedClientHandler, DEFAULT_CLIENT_METHODS,
};
pub use monitor::MonitorSubscribeHandler;
pub use peer::{PingHandler, PushDataHandler};

/// Runs on a gateway worker. Must not block on network round-trips.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, message: Message);
}

impl CommandHandler for OnionRelayHandler {
    fn handle(&self, message: Message) {
        OnionRelayHandler::handle(self, message)
    }
}

impl CommandHandler for StorageTestHandler {
    fn handle(&self, message: Message) {
        StorageTestHandler::handle(self, message)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use bytes::Bytes;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::ports::{ReachType, SwarmNode};

    /// Swarm node double that records every call.
    #[derive(Default)]
    pub struct RecordingNode {
        stats: Value,
        pub batches: Mutex<Vec<Bytes>>,
        pub pings: Mutex<Vec<ReachType>>,
        swarm_updates: AtomicUsize,
    }

    impl RecordingNode {
        pub fn with_stats(stats: Value) -> Self {
            Self {
                stats,
                ..Default::default()
            }
        }

        pub fn swarm_updates(&self) -> usize {
            self.swarm_updates.load(Ordering::SeqCst)
        }
    }

    impl SwarmNode for RecordingNode {
        fn process_push_batch(&self, blob: Bytes) {
            self.batches.lock().push(blob);
        }

        fn record_ping(&self, reach: ReachType) {
            self.pings.lock().push(reach);
        }

        fn stats(&self) -> Value {
            self.stats.clone()
        }

        fn update_swarms(&self) {
            self.swarm_updates.fetch_add(1, Ordering::SeqCst);
        }
    }
}
