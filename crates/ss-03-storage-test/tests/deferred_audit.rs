//! Audits that complete on another task after the handler returned.

use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use shared_types::testing::{capture_message, parts_as_strings, test_connection};
use shared_types::{AuthLevel, LegacyPubkey, PeerRecord, X25519Pubkey};
use ss_01_peer_resolver::{InMemoryPeerTable, PeerResolver};
use ss_03_storage_test::{
    StorageTestCallback, StorageTestExecutor, StorageTestHandler, StorageTestOutcome,
    StorageTestRequest, StorageTestResult,
};

/// Looks the message up on a spawned task, succeeding only at height 42.
struct SpawningExecutor {
    runtime: tokio::runtime::Handle,
}

impl StorageTestExecutor for SpawningExecutor {
    fn process_storage_test_req(
        &self,
        request: StorageTestRequest,
        _tester: LegacyPubkey,
        callback: StorageTestCallback,
    ) {
        self.runtime.spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let outcome = if request.height == 42 {
                StorageTestOutcome::Success(Bytes::from(request.msg_hash))
            } else {
                StorageTestOutcome::Retry
            };
            callback.complete(StorageTestResult::new(outcome, Duration::from_millis(5)));
        });
    }
}

fn handler() -> StorageTestHandler {
    let table = InMemoryPeerTable::with_peers([PeerRecord {
        ip: IpAddr::V6(Ipv6Addr::LOCALHOST),
        omq_port: 22020,
        https_port: 22021,
        pubkey_legacy: LegacyPubkey::new([2; 32]),
        pubkey_x25519: X25519Pubkey::new([1; 32]),
    }]);
    let executor = SpawningExecutor {
        runtime: tokio::runtime::Handle::current(),
    };
    StorageTestHandler::new(PeerResolver::new(Arc::new(table)), Arc::new(executor))
}

#[tokio::test]
async fn test_deferred_success_carries_answer() {
    let conn = test_connection(&[1; 32], AuthLevel::None, true);
    let (msg, rx) = capture_message(conn, [Bytes::from_static(b"42"), Bytes::from(vec![0u8; 64])]);

    handler().handle(msg);

    let reply = parts_as_strings(&rx.await.unwrap());
    assert_eq!(reply[0], "OK");
    assert_eq!(reply[1], "0".repeat(128));
}

#[tokio::test]
async fn test_deferred_retry_is_generic() {
    let conn = test_connection(&[1; 32], AuthLevel::None, true);
    let (msg, rx) = capture_message(conn, [Bytes::from_static(b"7"), Bytes::from(vec![0u8; 32])]);

    handler().handle(msg);

    assert_eq!(parts_as_strings(&rx.await.unwrap()), vec!["other"]);
}
