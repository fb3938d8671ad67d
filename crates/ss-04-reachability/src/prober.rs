use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use shared_types::{RequestOptions, Route, Transport};

use crate::test_record::ReachabilityTest;

/// How long a peer has to answer `sn.ping`.
pub const SN_PING_TIMEOUT: Duration = Duration::from_secs(5);

const PING_COMMAND: &str = "sn.ping";

/// Issues liveness pings through the node transport.
#[derive(Clone)]
pub struct ReachabilityProber {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl ReachabilityProber {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_timeout(transport, SN_PING_TIMEOUT)
    }

    pub fn with_timeout(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Ping the test's peer and append exactly one result to it.
    ///
    /// Uses an outgoing connection only; an inbound connection from the peer
    /// says nothing about whether its listener is reachable.
    pub async fn probe(&self, test: Arc<ReachabilityTest>) {
        let peer = test.peer();
        let route = Route::Peer {
            pubkey: peer.pubkey_x25519,
            address: peer.omq_address(),
        };
        let options = RequestOptions::with_timeout(self.timeout).outgoing_only();

        let request = self
            .transport
            .request(&route, PING_COMMAND, Vec::new(), options);
        let reachable = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(peer = %peer.pubkey_legacy, route = %route, error = %e, "ping failed");
                false
            }
            Err(_) => {
                debug!(peer = %peer.pubkey_legacy, route = %route, "ping timed out");
                false
            }
        };
        debug!(peer = %peer.pubkey_legacy, reachable, "reachability probe finished");
        test.add_result(reachable);
    }

    /// Run [`probe`](Self::probe) in the background.
    pub fn spawn_probe(&self, test: Arc<ReachabilityTest>) -> JoinHandle<()> {
        let prober = self.clone();
        tokio::spawn(async move { prober.probe(test).await })
    }
}
