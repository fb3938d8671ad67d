//! # Node Runtime
//!
//! Builds every subsystem from explicit collaborators, then runs the
//! bootstrap sequence.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Build peer resolver, monitor registry, rate limiter and gateway
//! 3. Connect to the daemon (retrying)
//! 4. Wait for the initial sync
//! 5. Bind the public listener (fatal on failure)
//! 6. Start maintenance tasks

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

use shared_types::Transport;
use ss_01_peer_resolver::{PeerResolver, PeerTable};
use ss_02_onion_relay::OnionRequestProcessor;
use ss_03_storage_test::StorageTestExecutor;
use ss_04_reachability::ReachabilityProber;
use ss_05_rpc_gateway::{
    build_swarm_gateway, ClientEndpointTable, GovernorRateLimiter, MonitorAuthenticator,
    MonitorFanout, MonitorRegistry, RpcGateway, SwarmNode, SwarmServices,
};

use crate::bootstrap::{BootstrapSequencer, BootstrapStage, InitialSync};
use crate::config::NodeConfig;

/// How often expired subscriptions and idle rate-limit buckets are dropped.
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// External collaborators the node is built from.
pub struct NodeCollaborators {
    pub transport: Arc<dyn Transport>,
    pub node: Arc<dyn SwarmNode>,
    pub peers: Arc<dyn PeerTable>,
    pub onion: Arc<dyn OnionRequestProcessor>,
    pub storage_test: Arc<dyn StorageTestExecutor>,
    pub endpoints: ClientEndpointTable,
    pub monitor_auth: Arc<dyn MonitorAuthenticator>,
    pub initial_sync: Arc<dyn InitialSync>,
}

/// The running node.
pub struct NodeRuntime {
    config: NodeConfig,
    gateway: Arc<RpcGateway>,
    resolver: PeerResolver,
    monitor: Arc<MonitorRegistry>,
    rate_limiter: Arc<GovernorRateLimiter>,
    prober: ReachabilityProber,
    sequencer: BootstrapSequencer,
    shutdown_tx: watch::Sender<bool>,
}

impl NodeRuntime {
    /// Build every subsystem. Must be called inside a tokio runtime.
    pub fn new(config: NodeConfig, collaborators: NodeCollaborators) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let NodeCollaborators {
            transport,
            node,
            peers,
            onion,
            storage_test,
            endpoints,
            monitor_auth,
            initial_sync,
        } = collaborators;

        let resolver = PeerResolver::new(peers);
        let monitor = Arc::new(MonitorRegistry::new(MonitorFanout::new(
            transport.clone(),
            Arc::new(resolver.clone()),
        )));
        let rate_limiter = Arc::new(GovernorRateLimiter::new(&config.gateway.rate_limit));

        let gateway = build_swarm_gateway(
            config.gateway.clone(),
            SwarmServices {
                node,
                resolver: resolver.clone(),
                onion,
                storage_test,
                endpoints,
                rate_limiter: rate_limiter.clone(),
                monitor: monitor.clone(),
                monitor_auth,
            },
        )
        .context("failed to build RPC gateway")?;

        let prober =
            ReachabilityProber::with_timeout(transport.clone(), config.gateway.ping_timeout());

        let authorizer = Arc::new(config.authorized_keys()?);
        info!(admin_keys = authorizer.len(), "loaded stats access keys");

        let sequencer = BootstrapSequencer::new(
            transport,
            config.daemon.rpc.clone(),
            config.listen_address(),
            authorizer,
            initial_sync,
            config.retry_policy(),
        );

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            resolver,
            monitor,
            rate_limiter,
            prober,
            sequencer,
            shutdown_tx,
        })
    }

    /// Run the bootstrap sequence, then start maintenance tasks.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Swarm Storage Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("  Listener: {}", self.config.listen_address());
        info!("===========================================");

        let daemon = self.sequencer.run().await.context("bootstrap failed")?;
        debug!(%daemon, "daemon connection established");

        self.spawn_maintenance();
        info!(commands = self.gateway.commands().len(), "node is running");
        Ok(())
    }

    fn spawn_maintenance(&self) {
        let monitor = self.monitor.clone();
        let rate_limiter = self.rate_limiter.clone();
        let mut shutdown = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let pruned = monitor.prune_expired(Instant::now());
                        rate_limiter.cleanup();
                        debug!(pruned, "maintenance pass");
                    }
                    _ = shutdown.changed() => {
                        info!("maintenance task stopping");
                        break;
                    }
                }
            }
        });
    }

    /// Stop background tasks and refuse further requests.
    pub fn shutdown(&self) {
        info!("initiating shutdown");
        self.gateway.shutdown();
        if self.shutdown_tx.send(true).is_err() {
            debug!("no background tasks running");
        }
    }

    /// Inbound entry point for the transport.
    pub fn gateway(&self) -> Arc<RpcGateway> {
        self.gateway.clone()
    }

    pub fn resolver(&self) -> &PeerResolver {
        &self.resolver
    }

    pub fn monitor(&self) -> Arc<MonitorRegistry> {
        self.monitor.clone()
    }

    pub fn prober(&self) -> &ReachabilityProber {
        &self.prober
    }

    pub fn stage(&self) -> BootstrapStage {
        self.sequencer.stage()
    }

    pub fn subscribe_stage(&self) -> watch::Receiver<BootstrapStage> {
        self.sequencer.subscribe()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}
