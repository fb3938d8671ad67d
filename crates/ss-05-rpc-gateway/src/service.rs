//! # Swarm Command Set
//!
//! Registers every command a storage node serves on a fresh gateway.
//!
//! | Command | Handler |
//! |---------|---------|
//! | `sn.data` | [`PushDataHandler`] |
//! | `sn.ping` | [`PingHandler`] |
//! | `sn.storage_test` | [`StorageTestHandler`] |
//! | `sn.onion_request` | [`OnionRelayHandler`] |
//! | `sn.storage_cc` | [`ForwardedClientHandler`] |
//! | `storage.<method>` | [`ClientMethodHandler`], one per endpoint |
//! | `monitor.messages` | [`MonitorSubscribeHandler`] |
//! | `service.get_stats` | [`StatsHandler`] |
//! | `notify.block` | [`BlockNotifyHandler`] |

use std::sync::Arc;
use tracing::info;

use ss_01_peer_resolver::PeerResolver;
use ss_02_onion_relay::{OnionRelayHandler, OnionRequestProcessor};
use ss_03_storage_test::{StorageTestExecutor, StorageTestHandler};

use crate::domain::{
    GatewayConfig, GatewayError, CATEGORY_MONITOR, CATEGORY_NOTIFY, CATEGORY_SERVICE,
    CATEGORY_SN, CATEGORY_STORAGE,
};
use crate::gateway::RpcGateway;
use crate::handlers::{
    BlockNotifyHandler, ClientEndpointTable, ClientMethodHandler, ForwardedClientHandler,
    MonitorSubscribeHandler, PingHandler, PushDataHandler, StatsHandler,
};
use crate::monitor::MonitorRegistry;
use crate::ports::{ClientRateLimiter, MonitorAuthenticator, SwarmNode};

/// Collaborators behind the swarm command set.
#[derive(Clone)]
pub struct SwarmServices {
    pub node: Arc<dyn SwarmNode>,
    pub resolver: PeerResolver,
    pub onion: Arc<dyn OnionRequestProcessor>,
    pub storage_test: Arc<dyn StorageTestExecutor>,
    pub endpoints: ClientEndpointTable,
    pub rate_limiter: Arc<dyn ClientRateLimiter>,
    pub monitor: Arc<MonitorRegistry>,
    pub monitor_auth: Arc<dyn MonitorAuthenticator>,
}

/// Build a gateway serving the full swarm command set.
pub fn build_swarm_gateway(
    config: GatewayConfig,
    services: SwarmServices,
) -> Result<RpcGateway, GatewayError> {
    let SwarmServices {
        node,
        resolver,
        onion,
        storage_test,
        endpoints,
        rate_limiter,
        monitor,
        monitor_auth,
    } = services;

    let mut builder = RpcGateway::builder(config);
    let stats = builder.stats();

    builder
        .add_command(CATEGORY_SN, "data", Arc::new(PushDataHandler::new(node.clone())))?
        .add_command(CATEGORY_SN, "ping", Arc::new(PingHandler::new(node.clone())))?
        .add_command(
            CATEGORY_SN,
            "storage_test",
            Arc::new(StorageTestHandler::new(resolver, storage_test)),
        )?
        .add_command(
            CATEGORY_SN,
            "onion_request",
            Arc::new(OnionRelayHandler::new(onion)),
        )?
        .add_command(
            CATEGORY_SN,
            "storage_cc",
            Arc::new(ForwardedClientHandler::new(endpoints.clone())),
        )?;

    for (name, endpoint) in endpoints.iter() {
        builder.add_command(
            CATEGORY_STORAGE,
            name,
            Arc::new(ClientMethodHandler::new(
                name,
                endpoint.clone(),
                rate_limiter.clone(),
            )),
        )?;
    }

    builder
        .add_command(
            CATEGORY_MONITOR,
            "messages",
            Arc::new(MonitorSubscribeHandler::new(monitor, monitor_auth)),
        )?
        .add_command(
            CATEGORY_SERVICE,
            "get_stats",
            Arc::new(StatsHandler::new(node.clone(), stats)),
        )?
        .add_command(CATEGORY_NOTIFY, "block", Arc::new(BlockNotifyHandler::new(node)))?;

    let gateway = builder.build()?;
    info!(
        client_methods = endpoints.len(),
        commands = gateway.commands().len(),
        "swarm command set registered"
    );
    Ok(gateway)
}
