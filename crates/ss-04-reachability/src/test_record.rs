use parking_lot::Mutex;

use shared_types::PeerRecord;

/// Accumulated probe results for one peer.
///
/// Shared between the caller and any in-flight probes. Probes can only
/// append.
#[derive(Debug)]
pub struct ReachabilityTest {
    peer: PeerRecord,
    results: Mutex<Vec<bool>>,
}

impl ReachabilityTest {
    pub fn new(peer: PeerRecord) -> Self {
        Self {
            peer,
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn peer(&self) -> &PeerRecord {
        &self.peer
    }

    pub fn add_result(&self, reachable: bool) {
        self.results.lock().push(reachable);
    }

    /// Snapshot of results in completion order.
    pub fn results(&self) -> Vec<bool> {
        self.results.lock().clone()
    }

    pub fn successes(&self) -> usize {
        self.results.lock().iter().filter(|r| **r).count()
    }
}
