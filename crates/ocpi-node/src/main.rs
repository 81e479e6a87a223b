//! `ocpi-node`: serve the OCPI versions and credentials modules plus the
//! admin API until Ctrl-C.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ocpi_node::{NodeConfig, OcpiNode};
use ocpi_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ocpi-node", version, about = "OCPI 2.2.1 credentials node")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "OCPI_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Port of the partner-facing listener
    #[arg(long, value_name = "PORT")]
    http_port: Option<u16>,

    /// Port of the admin listener
    #[arg(long, value_name = "PORT")]
    admin_port: Option<u16>,

    /// Externally reachable base URL
    #[arg(long, value_name = "URL")]
    public_url: Option<String>,

    /// Issue a token A at startup and print it
    #[arg(long)]
    issue_token_a: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(port) = self.http_port {
            config.gateway.http.port = port;
        }
        if let Some(port) = self.admin_port {
            config.gateway.admin.port = port;
        }
        if let Some(url) = &self.public_url {
            config.gateway.platform.public_url = url.clone();
        }
        if self.issue_token_a {
            config.bootstrap.issue_token_a = true;
        }
    }
}

fn load_config(args: &Args) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load_file(path)?,
        None => NodeConfig::default(),
    };
    config.apply_env()?;
    args.apply(&mut config);
    config
        .gateway
        .validate()
        .context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("failed to initialize telemetry")?;

    let config = load_config(&args)?;
    if args.check {
        info!("configuration is valid");
        return Ok(());
    }

    let node = OcpiNode::new(config).context("failed to build node")?;
    let running = node.start().await.context("failed to start node")?;

    // Printed for the operator, never logged.
    if let Some(token) = running.issued_token_a() {
        println!("token A:      {token}");
        println!("versions URL: {}", running.versions_url());
    }

    info!(addr = %running.http_addr(), "node is running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("initiating graceful shutdown");
    running.shutdown();
    running.wait().await.context("listener failed")?;
    Ok(())
}
