use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::types::{DEFAULT_HOST, DEFAULT_PORT, RawRelayConfig, RawServerConfig, RelayConfig};

/// Env var naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "SIGRELAY_CONFIG";
/// Env var overriding the listen port
pub const PORT_ENV: &str = "SERVER_PORT";
/// Env var overriding the bind host
pub const HOST_ENV: &str = "SERVER_HOST";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolve the final configuration
    ///
    /// Layers, lowest first: defaults, the TOML file at `path` (or
    /// `SIGRELAY_CONFIG`), `SERVER_HOST`/`SERVER_PORT`, then `overrides`.
    pub fn load(path: Option<&Path>, overrides: RawServerConfig) -> Result<RelayConfig> {
        let mut raw = RawServerConfig::default();

        // Layer 1: Config file
        if let Some(path) = Self::config_path(path) {
            raw = raw.merge(Self::read_file(&path)?.server);
        }

        // Layer 2: Environment
        raw = raw.merge(Self::from_env()?);

        // Layer 3: Command-line flags
        raw = raw.merge(overrides);

        Ok(Self::finalize(raw))
    }

    /// Explicit path wins over the environment
    fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit.map(Path::to_path_buf).or_else(|| {
            std::env::var_os(CONFIG_PATH_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
    }

    fn read_file(path: &Path) -> Result<RawRelayConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn from_env() -> Result<RawServerConfig> {
        let host = std::env::var(HOST_ENV).ok().filter(|v| !v.is_empty());
        let port = match std::env::var(PORT_ENV) {
            Ok(v) if !v.is_empty() => match v.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => bail!("{} must be a port number, got {:?}", PORT_ENV, v),
            },
            _ => None,
        };

        Ok(RawServerConfig {
            host,
            port,
            idle_timeout_secs: None,
        })
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawServerConfig) -> RelayConfig {
        RelayConfig {
            host: raw.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: raw.port.unwrap_or(DEFAULT_PORT),
            idle_timeout_secs: raw.idle_timeout_secs,
        }
    }
}
