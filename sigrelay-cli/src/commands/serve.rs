//! Serve command for running the signaling relay
//!
//! Peers connect over WebSocket at `/ws`; `/api/health` reports liveness.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use sigrelay_server::RelayServer;
use tracing::info;

use crate::config::{ConfigLoader, RawServerConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Close connections that send nothing for this many seconds
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Path to a TOML config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ServeArgs {
    fn overrides(&self) -> RawServerConfig {
        RawServerConfig {
            host: self.host.clone(),
            port: self.port,
            idle_timeout_secs: self.idle_timeout,
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load(args.config.as_deref(), args.overrides())?;
    let server_config = config.server_config();

    info!("Starting sigrelay on {}", server_config.addr());
    if let Some(timeout) = server_config.idle_timeout {
        info!("Idle connections close after {}s", timeout.as_secs());
    }

    RelayServer::new(server_config).run().await?;
    Ok(())
}
