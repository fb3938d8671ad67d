//! # Reachability Subsystem
//!
//! Pings peers with `sn.ping` and records one pass/fail result per probe in a
//! caller-owned [`ReachabilityTest`]. Deciding what the results mean is left
//! to the caller.

pub mod prober;
pub mod test_record;

pub use prober::{ReachabilityProber, SN_PING_TIMEOUT};
pub use test_record::ReachabilityTest;
