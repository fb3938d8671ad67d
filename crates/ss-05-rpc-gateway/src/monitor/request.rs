//! `monitor.messages` request parsing.
//!
//! The request is a single dictionary. Fields are read in ascending key
//! order (`P S d n p s t`) because the dictionary consumer is forward-only.

use bytes::Bytes;
use thiserror::Error;

use shared_types::bt::{self, BtDictConsumer, BtValue};
use shared_types::CodecError;

const MAX_PAST_SECS: i64 = 14 * 24 * 60 * 60;
const MAX_FUTURE_SECS: i64 = 24 * 60 * 60;

/// Subscription refusal. `errcode` and the `Display` text go back to the
/// client in a `{errcode, error}` dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("{0}")]
    BadArgs(String),

    #[error("{0}")]
    BadPubkey(String),

    #[error("{0}")]
    BadNamespace(String),

    #[error("{0}")]
    BadTimestamp(String),

    #[error("{0}")]
    BadSignature(String),
}

impl SubscribeError {
    pub fn errcode(&self) -> i64 {
        match self {
            SubscribeError::BadArgs(_) => 1,
            SubscribeError::BadPubkey(_) => 2,
            SubscribeError::BadNamespace(_) => 3,
            SubscribeError::BadTimestamp(_) => 4,
            SubscribeError::BadSignature(_) => 5,
        }
    }

    /// Encoded reply dictionary.
    pub fn to_reply(&self) -> Bytes {
        let reply = bt::dict([
            ("errcode", BtValue::from(self.errcode())),
            ("error", BtValue::from(self.to_string())),
        ]);
        Bytes::from(bt::encode(&reply))
    }
}

/// A parsed, not yet authenticated, subscription request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorRequest {
    /// `P`: session Ed25519 key the account is derived from.
    pub ed25519: Option<Bytes>,
    /// `S`: subkey for delegated signing.
    pub subkey: Option<Bytes>,
    /// `d`: include message data in notifications.
    pub want_data: bool,
    /// `n`: strictly ascending namespaces.
    pub namespaces: Vec<i16>,
    /// `p`: 33-byte prefixed account key.
    pub account: Option<Bytes>,
    /// `s`: 64-byte signature.
    pub signature: Bytes,
    /// `t`: signature time, unix seconds.
    pub timestamp: i64,
}

enum FieldError {
    Reject(SubscribeError),
    Invalid(String),
}

impl From<CodecError> for FieldError {
    fn from(e: CodecError) -> Self {
        FieldError::Invalid(e.to_string())
    }
}

impl MonitorRequest {
    pub fn parse(parts: &[Bytes]) -> Result<Self, SubscribeError> {
        let [raw] = parts else {
            return Err(SubscribeError::BadArgs(
                "Invalid arguments: monitor.messages takes a single bencoded dict parameter"
                    .into(),
            ));
        };
        if raw.len() < 2 || raw[0] != b'd' {
            return Err(SubscribeError::BadArgs(
                "Invalid arguments: monitor.messages parameter must be a bencoded dict".into(),
            ));
        }

        let mut dict =
            BtDictConsumer::new(raw).map_err(|e| SubscribeError::BadArgs(e.to_string()))?;
        match parse_fields(&mut dict) {
            Ok(request) => Ok(request),
            Err(FieldError::Reject(e)) => Err(e),
            Err(FieldError::Invalid(reason)) => Err(SubscribeError::BadArgs(format!(
                "Invalid arguments: invalid {}= value: {}",
                String::from_utf8_lossy(dict.key()),
                reason
            ))),
        }
    }
}

fn parse_fields(d: &mut BtDictConsumer<'_>) -> Result<MonitorRequest, FieldError> {
    let mut ed25519 = None;
    if d.skip_until("P")? {
        let key = d.consume_bytes()?;
        if key.len() != 32 {
            return Err(FieldError::Reject(SubscribeError::BadPubkey(
                "Provided P= Session Ed25519 pubkey must be 32 bytes".into(),
            )));
        }
        ed25519 = Some(Bytes::copy_from_slice(key));
    }

    let mut subkey = None;
    if d.skip_until("S")? {
        let key = d.consume_bytes()?;
        if key.len() != 32 {
            return Err(FieldError::Reject(SubscribeError::BadPubkey(
                "Provided S= subkey must be 32 bytes".into(),
            )));
        }
        subkey = Some(Bytes::copy_from_slice(key));
    }

    let mut want_data = false;
    if d.skip_until("d")? {
        want_data = match d.consume_integer::<i64>()? {
            0 => false,
            1 => true,
            other => return Err(FieldError::Invalid(format!("integer {} out of range", other))),
        };
    }

    if !d.skip_until("n")? {
        return Err(FieldError::Invalid("required namespace list is missing".into()));
    }
    let mut list = d.consume_list()?;
    let mut namespaces = vec![list.consume_integer::<i16>()?];
    while !list.is_finished() {
        let ns = list.consume_integer::<i16>()?;
        if namespaces.last().map_or(false, |last| ns <= *last) {
            return Err(FieldError::Reject(SubscribeError::BadNamespace(
                "Invalid n= namespace list: namespaces must be ascending".into(),
            )));
        }
        namespaces.push(ns);
    }

    let mut account = None;
    if d.skip_until("p")? {
        if ed25519.is_some() {
            return Err(FieldError::Invalid(
                "Cannot provide both p= and P= pubkey values".into(),
            ));
        }
        let key = d.consume_bytes()?;
        if key.len() != 33 {
            return Err(FieldError::Reject(SubscribeError::BadPubkey(
                "Provided p= pubkey must be 33 bytes".into(),
            )));
        }
        account = Some(Bytes::copy_from_slice(key));
    } else if ed25519.is_none() {
        return Err(FieldError::Invalid("Either p= or P= must be given".into()));
    }

    if !d.skip_until("s")? {
        return Err(FieldError::Invalid("required signature is missing".into()));
    }
    let signature = d.consume_bytes()?;
    if signature.len() != 64 {
        return Err(FieldError::Reject(SubscribeError::BadSignature(
            "Provided s= signature must be 64 bytes".into(),
        )));
    }
    let signature = Bytes::copy_from_slice(signature);

    if !d.skip_until("t")? {
        return Err(FieldError::Invalid(
            "required signature timestamp is missing".into(),
        ));
    }
    let timestamp = d.consume_integer::<i64>()?;

    Ok(MonitorRequest {
        ed25519,
        subkey,
        want_data,
        namespaces,
        account,
        signature,
        timestamp,
    })
}

/// Signature time must be at most 14 days old and 1 day ahead of `now`.
pub fn check_timestamp(timestamp: i64, now: i64) -> Result<(), SubscribeError> {
    let too_old = timestamp < now.saturating_sub(MAX_PAST_SECS);
    if too_old || timestamp > now.saturating_add(MAX_FUTURE_SECS) {
        return Err(SubscribeError::BadTimestamp(format!(
            "Invalid t= signature timestamp: timestamp is {}",
            if too_old { "too old" } else { "in the future" }
        )));
    }
    Ok(())
}

/// Text the subscriber signs: `MONITOR{account_hex}{t}{0|1}{ns,ns,...}`.
pub fn signature_text(
    account: &[u8],
    timestamp: i64,
    want_data: bool,
    namespaces: &[i16],
) -> String {
    let namespaces: Vec<String> = namespaces.iter().map(i16::to_string).collect();
    format!(
        "MONITOR{}{}{}{}",
        hex::encode(account),
        timestamp,
        u8::from(want_data),
        namespaces.join(",")
    )
}
