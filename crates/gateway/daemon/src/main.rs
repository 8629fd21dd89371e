//! Gateway Daemon - commit coordination over HTTP
//!
//! The daemon provides:
//! - REST API for channel, chaincode and invoke operations
//! - Read-only ledger queries
//! - A simulated multi-organization network to run against

use clap::Parser;
use gateway_daemon::error::{DaemonError, DaemonResult};
use gateway_daemon::{DaemonConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gateway Daemon CLI
#[derive(Parser)]
#[command(name = "gatewayd")]
#[command(about = "Gateway Daemon - propose, endorse, order and commit", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<String>,

    /// Listen address (overrides the config file)
    #[arg(short, long, env = "GATEWAY_LISTEN_ADDR")]
    listen: Option<String>,

    /// Log level (overrides the config file)
    #[arg(long, env = "GATEWAY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "GATEWAY_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print startup banner
    println!(
        r#"
   ____       _
  / ___| __ _| |_ _____      ____ _ _   _
 | |  _ / _` | __/ _ \ \ /\ / / _` | | | |
 | |_| | (_| | ||  __/\ V  V / (_| | |_| |
  \____|\__,_|\__\___| \_/\_/ \__,_|\__, |
                                    |___/
  Propose - Endorse - Order - Commit
  Version: {}
  Organizations: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        config
            .network
            .organizations
            .iter()
            .map(|o| o.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.server.listen_addr
    );

    let server = Server::new(config)?;
    server.run().await
}
