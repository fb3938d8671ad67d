//! # Storage Test Handler

use std::sync::Arc;
use tracing::{debug, error, warn};

use shared_types::{Continuation, DeferredReply, Message, PUBKEY_SIZE};
use ss_01_peer_resolver::PeerResolver;

use crate::domain::{StorageTestOutcome, StorageTestRejection, StorageTestRequest, StorageTestResult};
use crate::ports::StorageTestExecutor;

pub struct StorageTestHandler {
    resolver: PeerResolver,
    executor: Arc<dyn StorageTestExecutor>,
}

impl StorageTestHandler {
    pub fn new(resolver: PeerResolver, executor: Arc<dyn StorageTestExecutor>) -> Self {
        Self { resolver, executor }
    }

    /// Validate and dispatch one `sn.storage_test` request.
    pub fn handle(&self, message: Message) {
        let Message { conn, data, reply } = message;

        if conn.pubkey.len() != PUBKEY_SIZE {
            error!(
                remote = %conn.remote,
                key_len = conn.pubkey.len(),
                "bug: storage test called without a service node pubkey"
            );
            return reject(reply, StorageTestRejection::MissingTransportKey);
        }

        if data.len() < 2 {
            warn!(remote = %conn.remote, parts = data.len(), "storage test: not enough parts");
            return reject(reply, StorageTestRejection::InvalidParameters);
        }

        let Some(tester) = self.resolver.find_node_raw(&conn.pubkey) else {
            warn!(
                remote = %conn.remote,
                pubkey = %hex::encode(&conn.pubkey),
                "storage test from unknown peer"
            );
            return reject(reply, StorageTestRejection::UnknownPeer);
        };

        let request = match StorageTestRequest::parse(&data[0], &data[1]) {
            Ok(request) => request,
            Err(rejection) => {
                warn!(
                    tester = %tester.pubkey_legacy,
                    reason = %rejection,
                    "invalid storage test request"
                );
                return reject(reply, rejection);
            }
        };

        debug!(
            tester = %tester.pubkey_legacy,
            height = request.height,
            msg_hash = %request.msg_hash,
            "received storage test request"
        );

        let tester_key = tester.pubkey_legacy;
        let callback = Continuation::new("storage_test", move |result: StorageTestResult| {
            report(&result);
            reply.complete(result.outcome.into_reply_parts());
        });
        self.executor
            .process_storage_test_req(request, tester_key, callback);
    }
}

fn reject(reply: DeferredReply, rejection: StorageTestRejection) {
    reply.reply([rejection.to_string()]);
}

fn report(result: &StorageTestResult) {
    let elapsed_ms = result.elapsed.as_millis() as u64;
    match &result.outcome {
        StorageTestOutcome::Success(_) => debug!(elapsed_ms, "storage test success"),
        StorageTestOutcome::WrongRequest => warn!(elapsed_ms, "storage test: wrong request"),
        StorageTestOutcome::Retry => debug!(elapsed_ms, "storage test needs retry"),
        StorageTestOutcome::Error => error!(elapsed_ms, "storage test failed"),
    }
}
