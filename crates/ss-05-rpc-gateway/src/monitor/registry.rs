use bytes::Bytes;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use shared_types::bt::{self, BtValue};
use shared_types::ConnectionHandle;

use super::fanout::MonitorFanout;

/// How long a subscription lasts without renewal.
pub const SUBSCRIPTION_LIFETIME: Duration = Duration::from_secs(65 * 60);

#[derive(Debug, Clone)]
struct Subscription {
    conn: ConnectionHandle,
    namespaces: Vec<i16>,
    want_data: bool,
    expiry: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Created,
    Renewed,
}

/// A newly stored message, as reported by the storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// 33-byte prefixed account key.
    pub account: Bytes,
    pub hash: String,
    pub namespace: i16,
    pub timestamp_ms: i64,
    pub expiry_ms: i64,
    pub data: Bytes,
}

/// Live subscriptions keyed by account. One subscription per account and
/// connection; subscribing again renews it.
pub struct MonitorRegistry {
    subscriptions: DashMap<Bytes, Vec<Subscription>>,
    fanout: MonitorFanout,
}

impl MonitorRegistry {
    pub fn new(fanout: MonitorFanout) -> Self {
        Self {
            subscriptions: DashMap::new(),
            fanout,
        }
    }

    pub fn subscribe(
        &self,
        account: Bytes,
        conn: ConnectionHandle,
        namespaces: Vec<i16>,
        want_data: bool,
    ) -> SubscriptionStatus {
        self.subscribe_at(account, conn, namespaces, want_data, Instant::now())
    }

    pub fn subscribe_at(
        &self,
        account: Bytes,
        conn: ConnectionHandle,
        namespaces: Vec<i16>,
        want_data: bool,
        now: Instant,
    ) -> SubscriptionStatus {
        let expiry = now + SUBSCRIPTION_LIFETIME;
        let mut subs = self.subscriptions.entry(account).or_default();

        if let Some(existing) = subs.iter_mut().find(|s| s.conn == conn) {
            existing.namespaces = namespaces;
            existing.want_data = want_data;
            existing.expiry = expiry;
            return SubscriptionStatus::Renewed;
        }

        subs.push(Subscription {
            conn,
            namespaces,
            want_data,
            expiry,
        });
        SubscriptionStatus::Created
    }

    /// Notify live subscribers of `msg`'s account and namespace. Returns how
    /// many notifications were sent.
    pub fn notify_new_message(&self, msg: &StoredMessage) -> usize {
        self.notify_new_message_at(msg, Instant::now())
    }

    pub fn notify_new_message_at(&self, msg: &StoredMessage, now: Instant) -> usize {
        let mut metadata_only = Vec::new();
        let mut with_data = Vec::new();
        {
            let Some(subs) = self.subscriptions.get(&msg.account) else {
                return 0;
            };
            for sub in subs.iter() {
                if sub.expiry >= now && sub.namespaces.binary_search(&msg.namespace).is_ok() {
                    if sub.want_data {
                        with_data.push(sub.conn.clone());
                    } else {
                        metadata_only.push(sub.conn.clone());
                    }
                }
            }
        }

        let mut sent = 0;
        if !metadata_only.is_empty() {
            sent += self
                .fanout
                .notify(&metadata_only, &notification(msg, false));
        }
        if !with_data.is_empty() {
            sent += self.fanout.notify(&with_data, &notification(msg, true));
        }
        debug!(
            account = %hex::encode(&msg.account),
            namespace = msg.namespace,
            sent,
            "sent new message notifications"
        );
        sent
    }

    /// Drop subscriptions held by a closed connection.
    pub fn remove_connection(&self, conn: &ConnectionHandle) -> usize {
        self.remove_where(|s| &s.conn == conn)
    }

    /// Drop expired subscriptions.
    pub fn prune_expired(&self, now: Instant) -> usize {
        self.remove_where(|s| s.expiry < now)
    }

    fn remove_where(&self, predicate: impl Fn(&Subscription) -> bool) -> usize {
        let mut removed = 0;
        self.subscriptions.retain(|_, subs| {
            let before = subs.len();
            subs.retain(|s| !predicate(s));
            removed += before - subs.len();
            !subs.is_empty()
        });
        removed
    }

    /// Number of subscriptions across all accounts.
    pub fn len(&self) -> usize {
        self.subscriptions.iter().map(|e| e.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `{@: account, h: hash, n: namespace, t: timestamp, z: expiry[, ~: data]}`
fn notification(msg: &StoredMessage, include_data: bool) -> Bytes {
    let mut entries = vec![
        ("@", BtValue::from(msg.account.clone())),
        ("h", BtValue::from(msg.hash.as_str())),
        ("n", BtValue::from(i64::from(msg.namespace))),
        ("t", BtValue::from(msg.timestamp_ms)),
        ("z", BtValue::from(msg.expiry_ms)),
    ];
    if include_data {
        entries.push(("~", BtValue::from(msg.data.clone())));
    }
    Bytes::from(bt::encode(&bt::dict(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::testing::MockTransport;
    use shared_types::{ConnectionId, PeerAddressLookup, Route, X25519Pubkey};
    use std::sync::Arc;

    struct NoPeers;

    impl PeerAddressLookup for NoPeers {
        fn lookup_address(&self, _: &X25519Pubkey) -> Option<String> {
            None
        }
    }

    fn setup() -> (Arc<MockTransport>, MonitorRegistry) {
        let transport = Arc::new(MockTransport::new());
        let fanout = MonitorFanout::new(transport.clone(), Arc::new(NoPeers));
        (transport, MonitorRegistry::new(fanout))
    }

    fn account() -> Bytes {
        Bytes::from(vec![5u8; 33])
    }

    fn message(namespace: i16) -> StoredMessage {
        StoredMessage {
            account: account(),
            hash: "hash".into(),
            namespace,
            timestamp_ms: 1000,
            expiry_ms: 2000,
            data: Bytes::from_static(b"xyz"),
        }
    }

    fn conn(id: u64) -> ConnectionHandle {
        ConnectionHandle::Transport(ConnectionId(id))
    }

    #[test]
    fn test_subscribe_then_renew() {
        let (_, registry) = setup();
        assert_eq!(
            registry.subscribe(account(), conn(1), vec![0], false),
            SubscriptionStatus::Created
        );
        assert_eq!(
            registry.subscribe(account(), conn(1), vec![0, 1], true),
            SubscriptionStatus::Renewed
        );
        assert_eq!(
            registry.subscribe(account(), conn(2), vec![0], false),
            SubscriptionStatus::Created
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_notify_matches_namespace_and_data_flag() {
        let (transport, registry) = setup();
        registry.subscribe(account(), conn(1), vec![0, 5], false);
        registry.subscribe(account(), conn(2), vec![5], true);
        registry.subscribe(account(), conn(3), vec![7], true);

        assert_eq!(registry.notify_new_message(&message(5)), 2);

        let sends = transport.sends();
        assert_eq!(sends.len(), 2);
        let meta = &sends[0];
        assert_eq!(meta.route, Route::Connection(ConnectionId(1)));
        let mut expected = b"d1:@33:".to_vec();
        expected.extend_from_slice(&[5u8; 33]);
        expected.extend_from_slice(b"1:h4:hash1:ni5e1:ti1000e1:zi2000ee");
        assert_eq!(&meta.data[0][..], &expected[..]);
        let full = &sends[1];
        assert_eq!(full.route, Route::Connection(ConnectionId(2)));
        assert!(full.data[0].ends_with(b"1:zi2000e1:~3:xyze"));
    }

    #[test]
    fn test_expired_subscriptions_are_ignored() {
        let (transport, registry) = setup();
        let start = Instant::now();
        registry.subscribe_at(account(), conn(1), vec![0], false, start);

        let later = start + SUBSCRIPTION_LIFETIME + Duration::from_secs(1);
        assert_eq!(registry.notify_new_message_at(&message(0), later), 0);
        assert!(transport.sends().is_empty());

        assert_eq!(registry.prune_expired(later), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_other_account_not_notified() {
        let (transport, registry) = setup();
        registry.subscribe(Bytes::from(vec![6u8; 33]), conn(1), vec![0], false);
        assert_eq!(registry.notify_new_message(&message(0)), 0);
        assert!(transport.sends().is_empty());
    }

    #[test]
    fn test_remove_connection() {
        let (_, registry) = setup();
        registry.subscribe(account(), conn(1), vec![0], false);
        registry.subscribe(Bytes::from(vec![6u8; 33]), conn(1), vec![0], false);
        registry.subscribe(account(), conn(2), vec![0], false);

        assert_eq!(registry.remove_connection(&conn(1)), 2);
        assert_eq!(registry.len(), 1);
    }
}
