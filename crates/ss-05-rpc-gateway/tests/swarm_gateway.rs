//! End-to-end dispatch through the full swarm command set.

use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use shared_types::bt::{self, BtValue};
use shared_types::testing::{capture_message, parts_as_strings, test_connection, MockTransport};
use shared_types::{
    AuthLevel, ConnectionInfo, LegacyPubkey, PeerRecord, Response, ResponseReply, X25519Pubkey,
};
use ss_01_peer_resolver::{InMemoryPeerTable, PeerResolver};
use ss_02_onion_relay::{encode_onion_data, EncType, OnionMetadata, OnionRequestProcessor};
use ss_03_storage_test::{
    StorageTestCallback, StorageTestExecutor, StorageTestOutcome, StorageTestRequest,
    StorageTestResult,
};
use ss_05_rpc_gateway::{
    build_swarm_gateway, ClientEndpointTable, ClientRateLimiter, ClientRequestHandler,
    GatewayConfig, MonitorAuthError, MonitorAuthenticator, MonitorFanout, MonitorRegistry,
    ReachType, RpcGateway, StoredMessage, SwarmNode, SwarmServices,
};

const PEER_X25519: [u8; 32] = [0x11; 32];
const PEER_LEGACY: [u8; 32] = [0x22; 32];

#[derive(Default)]
struct Node {
    batches: Mutex<Vec<Bytes>>,
    pings: Mutex<Vec<ReachType>>,
}

impl SwarmNode for Node {
    fn process_push_batch(&self, blob: Bytes) {
        self.batches.lock().push(blob);
    }

    fn record_ping(&self, reach: ReachType) {
        self.pings.lock().push(reach);
    }

    fn stats(&self) -> Value {
        json!({ "version": "2.0.0" })
    }

    fn update_swarms(&self) {}
}

/// Answers every onion request with the hop it arrived at.
struct HopEcho;

impl OnionRequestProcessor for HopEcho {
    fn process_onion_req(&self, payload: Bytes, meta: OnionMetadata, reply: ResponseReply) {
        let body = format!("{}@{}", String::from_utf8_lossy(&payload), meta.hop_no);
        reply.complete(Response::ok(body));
    }
}

struct AlwaysFound;

impl StorageTestExecutor for AlwaysFound {
    fn process_storage_test_req(
        &self,
        _request: StorageTestRequest,
        _tester: LegacyPubkey,
        callback: StorageTestCallback,
    ) {
        callback.complete(StorageTestResult::new(
            StorageTestOutcome::Success(Bytes::from_static(b"stored-data")),
            Duration::from_millis(3),
        ));
    }
}

/// Echoes `method:params`, recording whether the request was forwarded.
#[derive(Default)]
struct Client {
    forwarded: Mutex<Vec<bool>>,
}

impl ClientRequestHandler for Client {
    fn process_client_req(
        &self,
        method: &str,
        params: Bytes,
        forwarded: bool,
        reply: ResponseReply,
    ) {
        self.forwarded.lock().push(forwarded);
        let body = format!("{}:{}", method, String::from_utf8_lossy(&params));
        reply.complete(Response::ok(body));
    }
}

/// Limits one remote address only.
struct BlockOne(&'static str);

impl ClientRateLimiter for BlockOne {
    fn should_rate_limit_client(&self, remote: &str) -> bool {
        remote == self.0
    }
}

/// Accepts any signature; the account is `0x05 || ed25519`.
struct TrustingAuth;

impl MonitorAuthenticator for TrustingAuth {
    fn derive_account(&self, ed25519: &[u8]) -> Option<Bytes> {
        let mut account = vec![0x05];
        account.extend_from_slice(ed25519);
        Some(Bytes::from(account))
    }

    fn verify(
        &self,
        _ed25519: &[u8],
        _subkey: Option<&[u8]>,
        _message: &[u8],
        _signature: &[u8],
    ) -> Result<(), MonitorAuthError> {
        Ok(())
    }
}

struct Harness {
    gateway: RpcGateway,
    node: Arc<Node>,
    client: Arc<Client>,
    transport: Arc<MockTransport>,
    monitor: Arc<MonitorRegistry>,
}

fn harness() -> Harness {
    let peer = PeerRecord {
        ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
        omq_port: 22020,
        https_port: 22021,
        pubkey_legacy: LegacyPubkey::new(PEER_LEGACY),
        pubkey_x25519: X25519Pubkey::new(PEER_X25519),
    };
    let resolver = PeerResolver::new(Arc::new(InMemoryPeerTable::with_peers([peer])));

    let transport = Arc::new(MockTransport::new());
    let monitor = Arc::new(MonitorRegistry::new(MonitorFanout::new(
        transport.clone(),
        Arc::new(resolver.clone()),
    )));

    let node = Arc::new(Node::default());
    let client = Arc::new(Client::default());
    let services = SwarmServices {
        node: node.clone(),
        resolver,
        onion: Arc::new(HopEcho),
        storage_test: Arc::new(AlwaysFound),
        endpoints: ClientEndpointTable::with_default_methods(client.clone()),
        rate_limiter: Arc::new(BlockOne("198.51.100.9:1000")),
        monitor: monitor.clone(),
        monitor_auth: Arc::new(TrustingAuth),
    };
    let gateway = build_swarm_gateway(GatewayConfig::default(), services).unwrap();

    Harness {
        gateway,
        node,
        client,
        transport,
        monitor,
    }
}

fn peer_conn() -> ConnectionInfo {
    test_connection(&PEER_X25519, AuthLevel::None, true)
}

fn anonymous_conn() -> ConnectionInfo {
    test_connection(&[], AuthLevel::None, false)
}

async fn call<B: Into<Bytes>>(
    gateway: &RpcGateway,
    name: &str,
    conn: ConnectionInfo,
    parts: Vec<B>,
) -> Vec<String> {
    let (msg, rx) = capture_message(conn, parts);
    gateway.handle_inbound(name, msg);
    let reply = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("reply within 5s")
        .expect("reply sent");
    parts_as_strings(&reply)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registers_full_command_set() {
    let h = harness();
    let commands = h.gateway.commands();

    for expected in [
        "sn.data",
        "sn.ping",
        "sn.storage_test",
        "sn.onion_request",
        "sn.storage_cc",
        "storage.retrieve",
        "storage.store",
        "monitor.messages",
        "service.get_stats",
        "notify.block",
    ] {
        assert!(
            commands.iter().any(|c| c == expected),
            "{} missing from {:?}",
            expected,
            commands
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_direct_and_forwarded_client_requests_share_endpoints() {
    let h = harness();

    let direct = call(&h.gateway, "storage.retrieve", anonymous_conn(), vec!["{}"]).await;
    assert_eq!(direct, vec!["retrieve:{}"]);

    let forwarded = call(
        &h.gateway,
        "sn.storage_cc",
        peer_conn(),
        vec!["retrieve", "{}"],
    )
    .await;
    assert_eq!(forwarded, vec!["retrieve:{}"]);

    assert_eq!(*h.client.forwarded.lock(), vec![false, true]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rate_limited_client_gets_429() {
    let h = harness();
    let mut conn = anonymous_conn();
    conn.remote = "198.51.100.9:1000".to_string();

    let reply = call(&h.gateway, "storage.store", conn, vec!["{}"]).await;
    assert_eq!(reply, vec!["429", "too many requests"]);
    assert!(h.client.forwarded.lock().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_peer_commands_refuse_clients() {
    let h = harness();

    let reply = call(&h.gateway, "sn.ping", anonymous_conn(), Vec::<Bytes>::new()).await;
    assert_eq!(reply[0], "403");
    assert!(h.node.pings.lock().is_empty());

    let reply = call(&h.gateway, "sn.ping", peer_conn(), Vec::<Bytes>::new()).await;
    assert_eq!(reply, vec!["pong"]);
    assert_eq!(*h.node.pings.lock(), vec![ReachType::Omq]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_push_data_reaches_node() {
    let h = harness();
    let reply = call(&h.gateway, "sn.data", peer_conn(), vec!["ab", "cd"]).await;
    assert!(reply.is_empty());
    assert_eq!(*h.node.batches.lock(), vec![Bytes::from_static(b"abcd")]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_onion_relay_enforces_path_length() {
    let h = harness();
    let key = X25519Pubkey::new([0x33; 32]);

    let ok = encode_onion_data(b"layer", &OnionMetadata::new(key, EncType::XChaCha20, 3));
    let reply = call(&h.gateway, "sn.onion_request", peer_conn(), vec![ok]).await;
    assert_eq!(reply, vec!["200", "layer@3"]);

    let long = encode_onion_data(b"layer", &OnionMetadata::new(key, EncType::AesGcm, 16));
    let reply = call(&h.gateway, "sn.onion_request", peer_conn(), vec![long]).await;
    assert_eq!(reply, vec!["400", "onion request max path length exceeded"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_storage_test_from_known_peer() {
    let h = harness();
    let msg_id = "a".repeat(64);

    let reply = call(
        &h.gateway,
        "sn.storage_test",
        peer_conn(),
        vec!["1234".to_string(), msg_id],
    )
    .await;
    assert_eq!(reply, vec!["OK", "stored-data"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stats_require_admin_and_include_gateway_counters() {
    let h = harness();

    let refused = call(&h.gateway, "service.get_stats", peer_conn(), Vec::<Bytes>::new()).await;
    assert_eq!(refused[0], "403");

    let admin = test_connection(&[], AuthLevel::Admin, false);
    let reply = call(&h.gateway, "service.get_stats", admin, Vec::<Bytes>::new()).await;
    let stats: Value = serde_json::from_str(&reply[0]).unwrap();
    assert_eq!(stats["version"], "2.0.0");
    assert_eq!(stats["gateway"]["service"]["rejected_access"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_monitor_subscription_receives_notifications() {
    let h = harness();
    let ed25519 = [0x44u8; 32];
    let now = chrono::Utc::now().timestamp();

    let request = bt::encode(&bt::dict(vec![
        ("P", BtValue::Bytes(Bytes::copy_from_slice(&ed25519))),
        ("n", BtValue::List(vec![BtValue::Int(0), BtValue::Int(5)])),
        ("s", BtValue::Bytes(Bytes::from(vec![9u8; 64]))),
        ("t", BtValue::Int(now)),
    ]));
    let reply = call(
        &h.gateway,
        "monitor.messages",
        anonymous_conn(),
        vec![Bytes::from(request)],
    )
    .await;
    assert_eq!(reply, vec!["d7:successi1ee"]);
    assert_eq!(h.monitor.len(), 1);

    let mut account = vec![0x05];
    account.extend_from_slice(&ed25519);
    let stored = StoredMessage {
        account: Bytes::from(account),
        hash: "hash".to_string(),
        namespace: 5,
        timestamp_ms: 1_700_000_000_000,
        expiry_ms: 1_700_000_600_000,
        data: Bytes::from_static(b"hello"),
    };
    assert_eq!(h.monitor.notify_new_message(&stored), 1);

    let sends = h.transport.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].command, "notify.message");
}
