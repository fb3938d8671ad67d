//! # Driven Ports (Outbound SPI)

use shared_types::{Continuation, LegacyPubkey};

use crate::domain::{StorageTestRequest, StorageTestResult};

/// Completion handle for one audit.
pub type StorageTestCallback = Continuation<StorageTestResult>;

/// Runs the audit against local storage.
///
/// Implementations must not block the caller; `callback` is completed
/// exactly once, from any thread, when the audit finishes.
pub trait StorageTestExecutor: Send + Sync {
    fn process_storage_test_req(
        &self,
        request: StorageTestRequest,
        tester: LegacyPubkey,
        callback: StorageTestCallback,
    );
}
