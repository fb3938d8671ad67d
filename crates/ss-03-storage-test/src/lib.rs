//! # Storage Test Subsystem
//!
//! Handles `sn.storage_test`: a swarm peer asks this node to prove it still
//! holds a message stored at a given block height.
//!
//! ## Validation Order
//!
//! Each check answers with its own reply and stops processing:
//!
//! | Step | Check | Reply |
//! |------|-------|-------|
//! | 1 | sender presented a 32-byte transport key | `unauthorized` |
//! | 2 | at least two parts | `invalid parameters` |
//! | 3 | sender is an active peer | `invalid pubkey` |
//! | 4 | height is a positive integer | `invalid height` |
//! | 5 | identifier is 32 or 64 bytes | `invalid msg hash` |
//!
//! Requests passing every check go to the [`StorageTestExecutor`]. Its
//! outcome maps to `("OK", answer)`, `wrong request` or `other`; retry and
//! error outcomes are indistinguishable on the wire.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    encode_msg_hash, StorageTestOutcome, StorageTestRejection, StorageTestRequest,
    StorageTestResult,
};
pub use ports::{StorageTestCallback, StorageTestExecutor};
pub use service::StorageTestHandler;
