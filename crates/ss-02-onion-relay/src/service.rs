//! # Onion Relay Handler
//!
//! Entry point for `sn.onion_request`. Replies from this handler are always
//! two parts, `(status, body)`, including `200`.

use std::sync::Arc;
use tracing::{debug, error, warn};

use shared_types::{Message, Response, ResponseReply};

use crate::domain::decode_onion_data;
use crate::ports::OnionRequestProcessor;
use crate::MAX_ONION_HOPS;

pub struct OnionRelayHandler {
    processor: Arc<dyn OnionRequestProcessor>,
}

impl OnionRelayHandler {
    pub fn new(processor: Arc<dyn OnionRequestProcessor>) -> Self {
        Self { processor }
    }

    /// Handle one relayed onion request.
    pub fn handle(&self, message: Message) {
        let Message { conn, data, reply } = message;

        if data.len() != 1 {
            let reason = format!(
                "Invalid internal onion request: expected 1 part, got {}",
                data.len()
            );
            error!(remote = %conn.remote, "{}", reason);
            reply.reply_response(Response::bad_request(reason), false);
            return;
        }

        let (payload, meta) = match decode_onion_data(&data[0]) {
            Ok(decoded) => decoded,
            Err(e) => {
                let reason = format!("Invalid internal onion request: {}", e);
                error!(remote = %conn.remote, "{}", reason);
                reply.reply_response(Response::bad_request(reason), false);
                return;
            }
        };

        let reply: ResponseReply = reply.into_response_reply(false);

        if meta.hop_no > MAX_ONION_HOPS {
            warn!(
                remote = %conn.remote,
                hop_no = meta.hop_no,
                "onion request exceeds max path length"
            );
            reply.complete(Response::bad_request(
                "onion request max path length exceeded",
            ));
            return;
        }

        debug!(
            hop_no = meta.hop_no,
            enc_type = %meta.enc_type,
            payload_len = payload.len(),
            "processing onion request"
        );
        self.processor.process_onion_req(payload, meta, reply);
    }
}
