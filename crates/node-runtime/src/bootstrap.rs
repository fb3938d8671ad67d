//! # Bootstrap Sequencer
//!
//! Startup is strictly ordered; each stage blocks until it completes:
//!
//! ```text
//! Disconnected
//!     → ConnectingToDaemon   retries with a fixed pause, never fatal
//!     → AwaitingInitialSync  waits on the external ready signal
//!     → BindingListener      one attempt; failure aborts startup
//!     → Running
//! ```
//!
//! The current stage is published on a `watch` channel.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{error, info, warn};

use shared_types::{AuthLevel, ConnectionAuthorizer, ConnectionId, Transport, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStage {
    Disconnected,
    ConnectingToDaemon,
    AwaitingInitialSync,
    BindingListener,
    Running,
}

impl fmt::Display for BootstrapStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BootstrapStage::Disconnected => "disconnected",
            BootstrapStage::ConnectingToDaemon => "connecting-to-daemon",
            BootstrapStage::AwaitingInitialSync => "awaiting-initial-sync",
            BootstrapStage::BindingListener => "binding-listener",
            BootstrapStage::Running => "running",
        };
        f.write_str(name)
    }
}

/// Fixed-interval retry schedule for the daemon connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(false, |max| attempts >= max)
    }
}

/// Signals that the node's initial state is ready to serve.
#[async_trait]
pub trait InitialSync: Send + Sync {
    /// Resolves once the initial sync has completed.
    async fn wait_ready(&self);
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Only possible with a bounded [`RetryPolicy`].
    #[error("daemon unreachable after {attempts} attempts: {last_error}")]
    DaemonUnreachable {
        attempts: u32,
        last_error: TransportError,
    },

    #[error("failed to bind listener on {address}: {source}")]
    ListenerBind {
        address: String,
        source: TransportError,
    },
}

impl BootstrapError {
    /// Whether startup must abort. Only a bind failure is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BootstrapError::ListenerBind { .. })
    }
}

pub struct BootstrapSequencer {
    transport: Arc<dyn Transport>,
    daemon_address: String,
    listen_address: String,
    authorizer: Arc<dyn ConnectionAuthorizer>,
    initial_sync: Arc<dyn InitialSync>,
    retry: RetryPolicy,
    stage: watch::Sender<BootstrapStage>,
}

impl BootstrapSequencer {
    pub fn new(
        transport: Arc<dyn Transport>,
        daemon_address: impl Into<String>,
        listen_address: impl Into<String>,
        authorizer: Arc<dyn ConnectionAuthorizer>,
        initial_sync: Arc<dyn InitialSync>,
        retry: RetryPolicy,
    ) -> Self {
        let (stage, _) = watch::channel(BootstrapStage::Disconnected);
        Self {
            transport,
            daemon_address: daemon_address.into(),
            listen_address: listen_address.into(),
            authorizer,
            initial_sync,
            retry,
            stage,
        }
    }

    /// Observe stage transitions.
    pub fn subscribe(&self) -> watch::Receiver<BootstrapStage> {
        self.stage.subscribe()
    }

    pub fn stage(&self) -> BootstrapStage {
        *self.stage.borrow()
    }

    /// Run every stage in order. Returns the daemon connection once the
    /// listener is up.
    pub async fn run(&self) -> Result<ConnectionId, BootstrapError> {
        let daemon = self.connect_daemon().await?;

        self.enter(BootstrapStage::AwaitingInitialSync);
        info!("waiting for initial sync");
        self.initial_sync.wait_ready().await;

        self.enter(BootstrapStage::BindingListener);
        if let Err(source) = self
            .transport
            .listen(&self.listen_address, self.authorizer.clone())
            .await
        {
            error!(
                address = %self.listen_address,
                error = %source,
                "server failed to bind to {}",
                self.listen_address
            );
            return Err(BootstrapError::ListenerBind {
                address: self.listen_address.clone(),
                source,
            });
        }
        info!(address = %self.listen_address, "listener bound");

        self.enter(BootstrapStage::Running);
        Ok(daemon)
    }

    async fn connect_daemon(&self) -> Result<ConnectionId, BootstrapError> {
        self.enter(BootstrapStage::ConnectingToDaemon);
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self
                .transport
                .connect_remote(&self.daemon_address, AuthLevel::Admin)
                .await
            {
                Ok(conn) => {
                    info!(daemon = %self.daemon_address, attempts, %conn, "connected to daemon");
                    return Ok(conn);
                }
                Err(e) => {
                    warn!(
                        daemon = %self.daemon_address,
                        attempt = attempts,
                        error = %e,
                        retry_in_ms = self.retry.interval.as_millis() as u64,
                        "failed to connect to daemon; retrying"
                    );
                    if self.retry.exhausted(attempts) {
                        self.enter(BootstrapStage::Disconnected);
                        return Err(BootstrapError::DaemonUnreachable {
                            attempts,
                            last_error: e,
                        });
                    }
                }
            }
            tokio::time::sleep(self.retry.interval).await;
        }
    }

    fn enter(&self, stage: BootstrapStage) {
        info!(%stage, "bootstrap stage");
        self.stage.send_replace(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::testing::MockTransport;
    use tokio::sync::Notify;

    struct AdminForAll;

    impl ConnectionAuthorizer for AdminForAll {
        fn authorize(&self, _remote: &str, _pubkey: &[u8], _remote_sn: bool) -> AuthLevel {
            AuthLevel::Admin
        }
    }

    struct Ready;

    #[async_trait]
    impl InitialSync for Ready {
        async fn wait_ready(&self) {}
    }

    /// Ready once notified.
    struct Gate(Notify);

    #[async_trait]
    impl InitialSync for Gate {
        async fn wait_ready(&self) {
            self.0.notified().await;
        }
    }

    fn sequencer(
        transport: Arc<MockTransport>,
        sync: Arc<dyn InitialSync>,
        retry: RetryPolicy,
    ) -> BootstrapSequencer {
        BootstrapSequencer::new(
            transport,
            "ipc://daemon.sock",
            "tcp://0.0.0.0:22020",
            Arc::new(AdminForAll),
            sync,
            retry,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retries_until_daemon_answers() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_connects(25);
        let seq = sequencer(transport.clone(), Arc::new(Ready), RetryPolicy::default());

        let started = tokio::time::Instant::now();
        seq.run().await.unwrap();

        assert_eq!(transport.connect_attempts(), 26);
        assert!(started.elapsed() >= Duration::from_millis(25 * 500));
        assert_eq!(seq.stage(), BootstrapStage::Running);
        assert!(transport.authorizer().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_retries_are_not_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_connects(u32::MAX);
        let retry = RetryPolicy::new(Duration::from_secs(1)).with_max_attempts(100);
        let seq = sequencer(transport.clone(), Arc::new(Ready), retry);

        let err = seq.run().await.unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::DaemonUnreachable { attempts: 100, .. }
        ));
        assert!(!err.is_fatal());
        assert_eq!(transport.connect_attempts(), 100);
        assert!(transport.authorizer().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bind_failure_is_fatal_and_not_retried() {
        let transport = Arc::new(MockTransport::new());
        transport.set_listen_result(Err(TransportError::BindFailed(
            "address in use".into(),
        )));
        let seq = sequencer(transport.clone(), Arc::new(Ready), RetryPolicy::default());

        let err = seq.run().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, BootstrapError::ListenerBind { ref address, .. } if address == "tcp://0.0.0.0:22020"));
        assert_eq!(seq.stage(), BootstrapStage::BindingListener);
        assert_eq!(transport.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_listener_waits_for_initial_sync() {
        let transport = Arc::new(MockTransport::new());
        let gate = Arc::new(Gate(Notify::new()));
        let seq = Arc::new(sequencer(transport.clone(), gate.clone(), RetryPolicy::default()));
        let mut stages = seq.subscribe();

        let running = tokio::spawn({
            let seq = seq.clone();
            async move { seq.run().await }
        });

        stages
            .wait_for(|s| *s == BootstrapStage::AwaitingInitialSync)
            .await
            .unwrap();
        assert!(transport.authorizer().is_none());

        gate.0.notify_one();
        running.await.unwrap().unwrap();
        assert_eq!(seq.stage(), BootstrapStage::Running);
        assert!(transport.authorizer().is_some());
    }
}
