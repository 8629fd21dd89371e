//! Configuration for gatewayd

use gateway_commit::CommitConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-operation commit timeouts
    #[serde(default)]
    pub commit: CommitConfig,

    /// Simulated network backing the node clients
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (an `EnvFilter` directive)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// One member organization of the simulated network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgConfig {
    pub name: String,
    pub peers: Vec<String>,
    /// Enrolled users
    #[serde(default)]
    pub users: Vec<String>,
}

/// Fault injection for the simulated network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Peers that answer every proposal with status 500
    #[serde(default)]
    pub rejecting_peers: Vec<String>,

    /// Peers that never deliver commit notifications
    #[serde(default)]
    pub silent_peers: Vec<String>,

    /// Probability that a committed transaction is marked invalid
    #[serde(default)]
    pub invalid_commit_rate: f64,
}

/// Simulated network layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_organizations")]
    pub organizations: Vec<OrgConfig>,

    /// Channels defined in every organization's connection profile
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    /// Base latency of every simulated round trip in milliseconds
    #[serde(default = "default_latency")]
    pub latency_ms: u64,

    /// Random extra latency in milliseconds
    #[serde(default)]
    pub jitter_ms: u64,

    #[serde(default)]
    pub faults: FaultConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            organizations: default_organizations(),
            channels: default_channels(),
            latency_ms: default_latency(),
            jitter_ms: 0,
            faults: FaultConfig::default(),
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_latency() -> u64 {
    20
}

fn default_channels() -> Vec<String> {
    vec!["mychannel".to_string()]
}

fn default_organizations() -> Vec<OrgConfig> {
    ["org1", "org2"]
        .into_iter()
        .map(|org| OrgConfig {
            name: org.to_string(),
            peers: vec![
                format!("peer0.{}.example.com", org),
                format!("peer1.{}.example.com", org),
            ],
            users: vec!["admin".to_string()],
        })
        .collect()
}

impl DaemonConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `GATEWAY__`-prefixed environment variables.
    ///
    /// A file path that was given but cannot be found is an error.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Nested keys use a double underscore: GATEWAY__SERVER__LISTEN_ADDR
        builder = builder.add_source(
            config::Environment::with_prefix("GATEWAY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
