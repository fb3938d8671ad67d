//! Onion metadata envelope codec.
//!
//! Lookups must happen in ascending key order: the dictionary consumer is
//! forward-only and skips everything sorting before the requested key.

use bytes::Bytes;
use thiserror::Error;

use shared_types::bt::{self, BtDictConsumer, BtValue};
use shared_types::{CodecError, KeyError, X25519Pubkey};

use super::metadata::{EncType, OnionMetadata};

/// Reasons an onion envelope cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnionError {
    #[error("required data payload not found")]
    MissingData,

    #[error("ephemeral key not found")]
    MissingEphemeralKey,

    #[error("invalid ephemeral key: {0}")]
    InvalidEphemeralKey(#[from] KeyError),

    #[error("unknown encryption type: {0}")]
    UnknownEncType(String),

    #[error("invalid encoding: {0}")]
    Codec(#[from] CodecError),
}

/// Serialize `payload` and `meta` into the relay envelope.
pub fn encode_onion_data(payload: &[u8], meta: &OnionMetadata) -> Bytes {
    let envelope = bt::dict([
        ("data", BtValue::from(payload)),
        ("enc_type", BtValue::from(meta.enc_type.as_str())),
        ("ephemeral_key", BtValue::from(&meta.ephemeral_key.as_bytes()[..])),
        ("hop_no", BtValue::from(meta.hop_no)),
    ]);
    Bytes::from(bt::encode(&envelope))
}

/// Parse a relay envelope into the payload and its metadata.
///
/// A missing `enc_type` means AES-GCM; a missing or sub-1 `hop_no` becomes 1.
pub fn decode_onion_data(data: &[u8]) -> Result<(Bytes, OnionMetadata), OnionError> {
    let mut dict = BtDictConsumer::new(data)?;

    if !dict.skip_until("data")? {
        return Err(OnionError::MissingData);
    }
    let payload = Bytes::copy_from_slice(dict.consume_bytes()?);

    let enc_type = if dict.skip_until("enc_type")? {
        let tag = dict.consume_bytes()?;
        String::from_utf8_lossy(tag).parse::<EncType>()?
    } else {
        EncType::AesGcm
    };

    if !dict.skip_until("ephemeral_key")? {
        return Err(OnionError::MissingEphemeralKey);
    }
    let ephemeral_key = X25519Pubkey::from_bytes(dict.consume_bytes()?)?;

    let mut hop_no = if dict.skip_until("hop_no")? {
        dict.consume_integer::<i32>()?
    } else {
        1
    };
    if hop_no < 1 {
        hop_no = 1;
    }

    Ok((payload, OnionMetadata::new(ephemeral_key, enc_type, hop_no)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key() -> X25519Pubkey {
        X25519Pubkey::new([0xab; 32])
    }

    fn envelope(entries: Vec<(&str, BtValue)>) -> Vec<u8> {
        bt::encode(&bt::dict(entries))
    }

    #[test]
    fn test_encode_emits_sorted_keys() {
        let meta = OnionMetadata::new(key(), EncType::XChaCha20, 3);
        let encoded = encode_onion_data(b"hi", &meta);
        let text = String::from_utf8_lossy(&encoded);

        let data = text.find("4:data").unwrap();
        let enc = text.find("8:enc_type").unwrap();
        let eph = text.find("13:ephemeral_key").unwrap();
        let hop = text.find("6:hop_no").unwrap();
        assert!(data < enc && enc < eph && eph < hop);
        assert!(text.ends_with("6:hop_noi3ee"));
    }

    #[test]
    fn test_missing_data_fails() {
        let input = envelope(vec![("ephemeral_key", BtValue::from(&[1u8; 32][..]))]);
        assert_eq!(decode_onion_data(&input), Err(OnionError::MissingData));
    }

    #[test]
    fn test_missing_ephemeral_key_fails() {
        let input = envelope(vec![("data", BtValue::from("x")), ("hop_no", BtValue::from(2))]);
        assert_eq!(decode_onion_data(&input), Err(OnionError::MissingEphemeralKey));
    }

    #[test]
    fn test_optional_fields_default() {
        let input = envelope(vec![
            ("data", BtValue::from("payload")),
            ("ephemeral_key", BtValue::from(&[0xab; 32][..])),
        ]);
        let (payload, meta) = decode_onion_data(&input).unwrap();
        assert_eq!(payload, Bytes::from_static(b"payload"));
        assert_eq!(meta.enc_type, EncType::AesGcm);
        assert_eq!(meta.hop_no, 1);
        assert_eq!(meta.ephemeral_key, key());
    }

    #[test]
    fn test_hop_no_clamped_to_one() {
        let input = envelope(vec![
            ("data", BtValue::from("p")),
            ("ephemeral_key", BtValue::from(&[0xab; 32][..])),
            ("hop_no", BtValue::from(-7)),
        ]);
        assert_eq!(decode_onion_data(&input).unwrap().1.hop_no, 1);
    }

    #[test]
    fn test_hop_no_above_max_is_left_to_caller() {
        let meta = OnionMetadata::new(key(), EncType::AesGcm, 40);
        let (_, decoded) = decode_onion_data(&encode_onion_data(b"p", &meta)).unwrap();
        assert_eq!(decoded.hop_no, 40);
    }

    #[test]
    fn test_short_ephemeral_key_rejected() {
        let input = envelope(vec![
            ("data", BtValue::from("p")),
            ("ephemeral_key", BtValue::from(&[1u8; 31][..])),
        ]);
        assert!(matches!(
            decode_onion_data(&input),
            Err(OnionError::InvalidEphemeralKey(_))
        ));
    }

    #[test]
    fn test_not_a_dictionary() {
        assert!(matches!(
            decode_onion_data(b"4:data"),
            Err(OnionError::Codec(_))
        ));
        assert!(decode_onion_data(b"").is_err());
    }

    #[test]
    fn test_truncated_input() {
        let meta = OnionMetadata::new(key(), EncType::AesGcm, 2);
        let encoded = encode_onion_data(b"payload", &meta);
        let truncated = &encoded[..encoded.len() - 20];
        assert!(decode_onion_data(truncated).is_err());
    }

    #[test]
    fn test_unknown_keys_are_skipped() {
        let input = envelope(vec![
            ("a_prefix", BtValue::from(9)),
            ("data", BtValue::from("p")),
            ("destination", BtValue::from("somewhere")),
            ("ephemeral_key", BtValue::from(&[0xab; 32][..])),
            ("zzz", BtValue::List(vec![BtValue::from(1)])),
        ]);
        let (payload, meta) = decode_onion_data(&input).unwrap();
        assert_eq!(payload, Bytes::from_static(b"p"));
        assert_eq!(meta.hop_no, 1);
    }

    fn enc_type_strategy() -> impl Strategy<Value = EncType> {
        prop_oneof![
            Just(EncType::AesGcm),
            Just(EncType::AesCbc),
            Just(EncType::XChaCha20)
        ]
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            payload in proptest::collection::vec(any::<u8>(), 0..512),
            key in any::<[u8; 32]>(),
            enc_type in enc_type_strategy(),
            hop_no in any::<i32>(),
        ) {
            let meta = OnionMetadata::new(X25519Pubkey::new(key), enc_type, hop_no);
            let (decoded_payload, decoded) =
                decode_onion_data(&encode_onion_data(&payload, &meta)).unwrap();

            prop_assert_eq!(&decoded_payload[..], &payload[..]);
            prop_assert_eq!(decoded.ephemeral_key, meta.ephemeral_key);
            prop_assert_eq!(decoded.enc_type, meta.enc_type);
            prop_assert_eq!(decoded.hop_no, hop_no.max(1));
        }
    }
}
