//! Storage test requests and outcomes.

mod outcome;
mod request;

pub use outcome::{StorageTestOutcome, StorageTestResult};
pub use request::{encode_msg_hash, StorageTestRejection, StorageTestRequest};
