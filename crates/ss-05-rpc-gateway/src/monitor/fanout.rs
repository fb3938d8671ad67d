use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, trace};

use shared_types::{ConnectionHandle, PeerAddressLookup, Transport};

/// Command pushed to subscribers.
pub const NOTIFY_COMMAND: &str = "notify.message";

/// Best-effort delivery of notifications to subscriber connections.
#[derive(Clone)]
pub struct MonitorFanout {
    transport: Arc<dyn Transport>,
    lookup: Arc<dyn PeerAddressLookup>,
}

impl MonitorFanout {
    pub fn new(transport: Arc<dyn Transport>, lookup: Arc<dyn PeerAddressLookup>) -> Self {
        Self { transport, lookup }
    }

    /// Push `payload` to every subscriber whose handle resolves. Unresolvable
    /// handles and failed sends are skipped. Returns how many sends were
    /// handed to the transport.
    pub fn notify(&self, subscribers: &[ConnectionHandle], payload: &Bytes) -> usize {
        let mut sent = 0;
        for handle in subscribers {
            let Some(route) = handle.resolve(self.lookup.as_ref()) else {
                trace!(?handle, "skipping unresolvable subscriber");
                continue;
            };
            match self
                .transport
                .send(&route, NOTIFY_COMMAND, vec![payload.clone()])
            {
                Ok(()) => sent += 1,
                Err(e) => debug!(route = %route, error = %e, "notification send failed"),
            }
        }
        sent
    }
}
