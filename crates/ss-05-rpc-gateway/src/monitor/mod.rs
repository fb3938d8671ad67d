//! # Monitor Subscriptions
//!
//! Clients subscribe with `monitor.messages` to hear about new messages for
//! an account. Subscriptions live in the [`MonitorRegistry`]; notifications
//! go out through the [`MonitorFanout`] as one-way `notify.message` sends.

mod fanout;
mod registry;
mod request;

pub use fanout::{MonitorFanout, NOTIFY_COMMAND};
pub use registry::{MonitorRegistry, StoredMessage, SubscriptionStatus, SUBSCRIPTION_LIFETIME};
pub use request::{check_timestamp, signature_text, MonitorRequest, SubscribeError};
