use std::time::Duration;

use serde::{Deserialize, Serialize};
use sigrelay_server::ServerConfig;

/// Default host for the relay
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port for the relay
pub const DEFAULT_PORT: u16 = 8080;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRelayConfig {
    #[serde(default)]
    pub server: RawServerConfig,
}

/// Server section with optional fields, so each layer only overrides what it sets
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RawServerConfig {
    /// Host address to bind to
    pub host: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,

    /// Close connections idle for this many seconds
    pub idle_timeout_secs: Option<u64>,
}

impl RawServerConfig {
    /// Overlay `other` on top of `self`; values set in `other` win
    pub fn merge(self, other: RawServerConfig) -> RawServerConfig {
        RawServerConfig {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            idle_timeout_secs: other.idle_timeout_secs.or(self.idle_timeout_secs),
        }
    }
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// `None` or `0` disables the idle timeout
    pub idle_timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            idle_timeout_secs: None,
        }
    }
}

impl RelayConfig {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            idle_timeout: self
                .idle_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}
