//! # Node Configuration
//!
//! Unified configuration for the node, loaded from TOML and then overridden
//! from the environment.
//!
//! ## Environment Overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SS_OMQ_PORT` | `network.omq_port` |
//! | `SS_DAEMON_RPC` | `daemon.rpc` |
//! | `SS_LOG_LEVEL` | `logging.level` |
//!
//! ## Validation
//!
//! - The public listener must bind an outward-facing address, never loopback
//! - The daemon retry interval must be non-zero
//! - Every stats access key must be 64 hex characters

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use shared_types::X25519Pubkey;
use ss_05_rpc_gateway::{AuthorizedKeySet, GatewayConfig};

use crate::bootstrap::RetryPolicy;

pub const ENV_OMQ_PORT: &str = "SS_OMQ_PORT";
pub const ENV_DAEMON_RPC: &str = "SS_DAEMON_RPC";
pub const ENV_LOG_LEVEL: &str = "SS_LOG_LEVEL";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Public listener.
    pub network: NetworkConfig,
    /// Upstream daemon connection.
    pub daemon: DaemonConfig,
    /// Administrative access.
    pub security: SecurityConfig,
    /// Log output.
    pub logging: LoggingConfig,
    /// RPC gateway limits.
    pub gateway: GatewayConfig,
}

/// Public listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address the node-to-node listener binds.
    pub omq_ip: IpAddr,
    /// Node-to-node listener port.
    pub omq_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            omq_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            omq_port: 22020,
        }
    }
}

/// Upstream daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Daemon RPC address.
    pub rpc: String,
    /// Pause between failed connection attempts.
    pub retry_interval_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc: "ipc:///var/lib/oxen/oxend.sock".to_string(),
            retry_interval_ms: 500,
        }
    }
}

/// Administrative access configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Hex transport keys granted administrative access.
    pub stats_access_keys: Vec<String>,
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("listener must bind a public address, not {0}")]
    LoopbackBind(IpAddr),

    #[error("daemon.retry_interval_ms cannot be 0")]
    ZeroRetryInterval,

    #[error("invalid stats access key {key:?}: {reason}")]
    InvalidAccessKey { key: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] ss_05_rpc_gateway::ConfigError),
}

impl NodeConfig {
    /// Read `path`, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML. Missing sections and fields take their defaults.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `SS_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup(ENV_OMQ_PORT) {
            self.network.omq_port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_OMQ_PORT,
                value: port.clone(),
            })?;
        }
        if let Some(rpc) = lookup(ENV_DAEMON_RPC) {
            self.daemon.rpc = rpc;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.omq_ip.is_loopback() {
            return Err(ConfigError::LoopbackBind(self.network.omq_ip));
        }
        if self.daemon.retry_interval_ms == 0 {
            return Err(ConfigError::ZeroRetryInterval);
        }
        self.authorized_keys()?;
        self.gateway.validate()?;
        Ok(())
    }

    /// Keys granted administrative access on the public listener.
    pub fn authorized_keys(&self) -> Result<AuthorizedKeySet, ConfigError> {
        let keys = self
            .security
            .stats_access_keys
            .iter()
            .map(|key| {
                if key.len() != 64 {
                    return Err(ConfigError::InvalidAccessKey {
                        key: key.clone(),
                        reason: format!("expected 64 hex characters, got {}", key.len()),
                    });
                }
                X25519Pubkey::from_hex(key).map_err(|e| ConfigError::InvalidAccessKey {
                    key: key.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AuthorizedKeySet::new(keys))
    }

    /// Listener address in transport URL form.
    pub fn listen_address(&self) -> String {
        match self.network.omq_ip {
            IpAddr::V4(ip) => format!("tcp://{}:{}", ip, self.network.omq_port),
            IpAddr::V6(ip) => format!("tcp://[{}]:{}", ip, self.network.omq_port),
        }
    }

    /// Daemon connection retry schedule. Production never gives up.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.daemon.retry_interval_ms))
    }
}
