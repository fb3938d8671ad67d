use bytes::Bytes;
use std::time::Duration;

/// Result of auditing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTestOutcome {
    /// Message found; carries the proof answer.
    Success(Bytes),
    /// The request does not match what this node stores.
    WrongRequest,
    /// Not answerable yet (e.g. still syncing).
    Retry,
    Error,
}

impl StorageTestOutcome {
    /// Reply parts for the requesting peer.
    pub fn into_reply_parts(self) -> Vec<Bytes> {
        match self {
            StorageTestOutcome::Success(answer) => vec![Bytes::from_static(b"OK"), answer],
            StorageTestOutcome::WrongRequest => vec![Bytes::from_static(b"wrong request")],
            StorageTestOutcome::Retry | StorageTestOutcome::Error => {
                vec![Bytes::from_static(b"other")]
            }
        }
    }
}

/// Outcome plus how long the audit took. `elapsed` is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageTestResult {
    pub outcome: StorageTestOutcome,
    pub elapsed: Duration,
}

impl StorageTestResult {
    pub fn new(outcome: StorageTestOutcome, elapsed: Duration) -> Self {
        Self { outcome, elapsed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_and_error_look_the_same() {
        assert_eq!(
            StorageTestOutcome::Retry.into_reply_parts(),
            StorageTestOutcome::Error.into_reply_parts()
        );
    }

    #[test]
    fn test_success_is_two_parts() {
        let parts = StorageTestOutcome::Success(Bytes::from_static(b"proof")).into_reply_parts();
        assert_eq!(parts, vec![Bytes::from_static(b"OK"), Bytes::from_static(b"proof")]);
    }
}
