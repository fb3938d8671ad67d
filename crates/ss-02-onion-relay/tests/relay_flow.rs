//! Relay flow with a processor that answers later from another thread.

use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use parking_lot::Mutex;
use shared_types::testing::{capture_message, parts_as_strings, test_connection};
use shared_types::{AuthLevel, Body, Response, ResponseReply, StatusCode, X25519Pubkey};
use ss_02_onion_relay::{
    encode_onion_data, EncType, OnionMetadata, OnionRelayHandler, OnionRequestProcessor,
};

/// Parks each request and answers it from a background thread.
#[derive(Default)]
struct DeferredProcessor {
    workers: Mutex<Vec<thread::JoinHandle<()>>>,
}

impl OnionRequestProcessor for DeferredProcessor {
    fn process_onion_req(&self, payload: Bytes, meta: OnionMetadata, reply: ResponseReply) {
        let worker = thread::spawn(move || {
            let body = serde_json::json!({
                "hop": meta.hop_no,
                "len": payload.len(),
            });
            reply.complete(Response::new(StatusCode::OK, Body::Json(body)));
        });
        self.workers.lock().push(worker);
    }
}

#[tokio::test]
async fn test_deferred_json_reply_is_two_part_compact_text() {
    let processor = Arc::new(DeferredProcessor::default());
    let handler = OnionRelayHandler::new(processor.clone());

    let meta = OnionMetadata::new(X25519Pubkey::new([1; 32]), EncType::XChaCha20, 2);
    let conn = test_connection(&[2; 32], AuthLevel::None, true);
    let (msg, rx) = capture_message(conn, [encode_onion_data(b"abcd", &meta)]);

    handler.handle(msg);

    let reply = rx.await.unwrap();
    assert_eq!(parts_as_strings(&reply), vec!["200", r#"{"hop":2,"len":4}"#]);

    for worker in processor.workers.lock().drain(..) {
        worker.join().unwrap();
    }
}

#[tokio::test]
async fn test_error_status_from_processor_passes_through() {
    struct Failing;
    impl OnionRequestProcessor for Failing {
        fn process_onion_req(&self, _: Bytes, _: OnionMetadata, reply: ResponseReply) {
            reply.complete(Response::new(StatusCode::BAD_GATEWAY, "next hop unreachable"));
        }
    }

    let handler = OnionRelayHandler::new(Arc::new(Failing));
    let meta = OnionMetadata::new(X25519Pubkey::new([1; 32]), EncType::AesGcm, 1);
    let conn = test_connection(&[2; 32], AuthLevel::None, true);
    let (msg, rx) = capture_message(conn, [encode_onion_data(b"x", &meta)]);

    handler.handle(msg);

    assert_eq!(
        parts_as_strings(&rx.await.unwrap()),
        vec!["502", "next hop unreachable"]
    );
}
