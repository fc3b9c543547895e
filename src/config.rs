//! Node configuration and logging setup.
//!
//! Every option can be given as a flag or through the environment, which is how nodes are configured when
//! they run in containers.

use anyhow::{Context, Result};
use clap::parser::ValueSource;
use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::crdt::types::ReplicaId;
use crate::gossip::disseminator::{DEFAULT_GOSSIP_INTERVAL, DEFAULT_PUSH_TIMEOUT};
use crate::metrics::generator::{DEFAULT_DEVICES, DEFAULT_GENERATE_INTERVAL};

pub const DEFAULT_PORT: u16 = 7000;

/// Port variable read by every other node implementation of the mesh.
pub const MESH_PORT_ENV: &str = "PORTA";
/// Peer list variable read by every other node implementation of the mesh.
pub const MESH_PEERS_ENV: &str = "COMPANHEIROS";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "lww-node",
    about = "Replicated LWW key-value node with full-state gossip",
    version
)]
pub struct NodeConfig {
    /// Address to bind the HTTP listener to.
    #[arg(long, env = "LWW_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    #[arg(short, long, env = "LWW_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Comma separated `host:port` list of peers to gossip with.
    #[arg(long, env = "LWW_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Replica id used to stamp local writes. Defaults to the port.
    #[arg(long, env = "LWW_REPLICA_ID")]
    pub replica_id: Option<u64>,

    #[arg(long, env = "LWW_GOSSIP_INTERVAL_MS", default_value_t = DEFAULT_GOSSIP_INTERVAL.as_millis() as u64)]
    pub gossip_interval_ms: u64,

    #[arg(long, env = "LWW_PUSH_TIMEOUT_MS", default_value_t = DEFAULT_PUSH_TIMEOUT.as_millis() as u64)]
    pub push_timeout_ms: u64,

    /// Run the synthetic metric generator.
    #[arg(long, env = "LWW_GENERATE", default_value_t = true, action = ArgAction::Set)]
    pub generate: bool,

    #[arg(long, env = "LWW_GENERATE_INTERVAL_MS", default_value_t = DEFAULT_GENERATE_INTERVAL.as_millis() as u64)]
    pub generate_interval_ms: u64,

    /// Number of synthetic devices.
    #[arg(long, env = "LWW_DEVICES", default_value_t = DEFAULT_DEVICES)]
    pub devices: usize,

    /// Also write logs to `<dir>/node_<port>.log`.
    #[arg(long, env = "LWW_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            peers: Vec::new(),
            replica_id: None,
            gossip_interval_ms: DEFAULT_GOSSIP_INTERVAL.as_millis() as u64,
            push_timeout_ms: DEFAULT_PUSH_TIMEOUT.as_millis() as u64,
            generate: true,
            generate_interval_ms: DEFAULT_GENERATE_INTERVAL.as_millis() as u64,
            devices: DEFAULT_DEVICES,
            log_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Parses flags and `LWW_*` variables, then falls back to the mesh-wide `PORTA` / `COMPANHEIROS`
    /// variables for the port and peers when neither was set explicitly.
    pub fn load() -> Result<Self> {
        let arg_matches = Self::command().get_matches();
        Self::from_matches_with_fallback(&arg_matches, |name| std::env::var(name).ok())
    }

    pub fn from_matches_with_fallback<F>(arg_matches: &ArgMatches, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_arg_matches(arg_matches)?;
        let unset = |id: &str| {
            matches!(
                arg_matches.value_source(id),
                None | Some(ValueSource::DefaultValue)
            )
        };

        if unset("port")
            && let Some(port) = lookup(MESH_PORT_ENV)
        {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value {:?}", MESH_PORT_ENV, port))?;
        }
        if unset("peers")
            && let Some(peers) = lookup(MESH_PEERS_ENV)
        {
            config.peers = peers.split(',').map(str::to_string).collect();
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Peers with surrounding whitespace and empty items removed.
    pub fn peer_list(&self) -> Vec<String> {
        self.peers
            .iter()
            .map(|peer| peer.trim())
            .filter(|peer| !peer.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The configured replica id, or the port the node actually bound when none was given.
    ///
    /// With `--port 0` the bound port is only known after binding, so the default must be resolved then.
    pub fn replica_id_for(&self, bound_port: u16) -> ReplicaId {
        ReplicaId(self.replica_id.unwrap_or(bound_port as u64))
    }

    pub fn gossip_interval(&self) -> Duration {
        Duration::from_millis(self.gossip_interval_ms)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }

    pub fn generate_interval(&self) -> Duration {
        Duration::from_millis(self.generate_interval_ms)
    }

    /// Rejects values that would make a periodic task spin.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.gossip_interval_ms > 0, "gossip interval must be positive");
        anyhow::ensure!(self.push_timeout_ms > 0, "push timeout must be positive");
        anyhow::ensure!(
            !self.generate || self.generate_interval_ms > 0,
            "generate interval must be positive"
        );
        Ok(())
    }
}

/// Installs the global subscriber: stdout always, plus a log file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop and must live as long as the process.
pub fn init_logging(config: &NodeConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log filter {:?}", config.log_level))?;
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let appender =
                tracing_appender::rolling::never(dir, format!("node_{}.log", config.port));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init()?;
            Ok(None)
        }
    }
}
