//! `monitor.messages`: subscribe to new-message notifications.

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, warn};

use shared_types::{ConnectionHandle, Message};

use super::CommandHandler;
use crate::monitor::{
    check_timestamp, signature_text, MonitorRegistry, MonitorRequest, SubscribeError,
};
use crate::ports::MonitorAuthenticator;

const SUCCESS_REPLY: &[u8] = b"d7:successi1ee";

pub struct MonitorSubscribeHandler {
    registry: Arc<MonitorRegistry>,
    authenticator: Arc<dyn MonitorAuthenticator>,
}

impl MonitorSubscribeHandler {
    pub fn new(
        registry: Arc<MonitorRegistry>,
        authenticator: Arc<dyn MonitorAuthenticator>,
    ) -> Self {
        Self {
            registry,
            authenticator,
        }
    }

    fn subscribe(&self, message: &Message, now: i64) -> Result<(), SubscribeError> {
        let request = MonitorRequest::parse(&message.data)?;
        check_timestamp(request.timestamp, now)?;

        let (account, signing_key) = match (&request.ed25519, &request.account) {
            (Some(ed25519), _) => {
                let account = self.authenticator.derive_account(ed25519).ok_or_else(|| {
                    SubscribeError::BadPubkey("Invalid P= ed25519 public key".into())
                })?;
                (account, ed25519.clone())
            }
            // Without P= the account key minus its prefix byte is the Ed25519 key.
            (None, Some(account)) => (account.clone(), account.slice(1..)),
            (None, None) => {
                return Err(SubscribeError::BadArgs(
                    "Either p= or P= must be given".into(),
                ))
            }
        };

        let text = signature_text(
            &account,
            request.timestamp,
            request.want_data,
            &request.namespaces,
        );
        if let Err(e) = self.authenticator.verify(
            &signing_key,
            request.subkey.as_deref(),
            text.as_bytes(),
            &request.signature,
        ) {
            warn!(
                account = %hex::encode(&account),
                error = %e,
                "monitor subscription signature rejected"
            );
            return Err(SubscribeError::BadSignature(e.to_string()));
        }

        let status = self.registry.subscribe(
            account.clone(),
            ConnectionHandle::Transport(message.conn.id),
            request.namespaces.clone(),
            request.want_data,
        );
        debug!(
            account = %hex::encode(&account),
            namespaces = ?request.namespaces,
            ?status,
            "monitor.messages subscription"
        );
        Ok(())
    }
}

impl CommandHandler for MonitorSubscribeHandler {
    fn handle(&self, message: Message) {
        let now = chrono::Utc::now().timestamp();
        let reply = match self.subscribe(&message, now) {
            Ok(()) => Bytes::from_static(SUCCESS_REPLY),
            Err(e) => {
                debug!(
                    remote = %message.conn.remote,
                    errcode = e.errcode(),
                    error = %e,
                    "monitor subscription refused"
                );
                e.to_reply()
            }
        };
        message.send_reply([reply]);
    }
}
