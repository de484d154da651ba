use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tunnel_agent::{AgentConfig, AgentMode, FileDirectory, Maintainer, PeerDirectory, SERVER_ADDR_NAME};
use tunnel_transport::{HostConfig, Multiaddr, PeerAddrInfo, TcpHost, DEFAULT_LISTEN_PORT};

#[derive(Parser)]
#[command(name = "tunnel-agent", about = "Edge tunnel agent and relay")]
struct Cli {
    /// Peer directory file (JSON), shared by the relay and its agents.
    #[arg(long, global = true, default_value = "peers.json")]
    directory: PathBuf,

    /// Listen address(es). Default: /ip4/0.0.0.0/tcp/20006 for the relay,
    /// an ephemeral port for agents.
    #[arg(long, global = true, num_args = 1..)]
    listen: Vec<Multiaddr>,

    /// Address(es) to advertise instead of the bound ones.
    #[arg(long, global = true, num_args = 1..)]
    announce: Vec<Multiaddr>,

    /// 32-byte Ed25519 secret seed (hex) for a stable identity.
    #[arg(long, global = true)]
    secret_seed: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Keep this node attached to the relay.
    Agent {
        /// Directory name this node publishes its record under.
        #[arg(long)]
        node_name: String,
        /// server-client or client-only.
        #[arg(long, default_value = "server-client")]
        mode: AgentMode,
        /// Directory name of the relay's record.
        #[arg(long)]
        relay_name: Option<String>,
        /// Seconds between maintenance cycles.
        #[arg(long, default_value = "10")]
        heartbeat_secs: u64,
    },

    /// Publish this node as the relay and accept agents.
    Relay {
        /// Directory name to publish the relay record under.
        #[arg(long, default_value = SERVER_ADDR_NAME)]
        relay_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let default_port = match cli.command {
        Command::Relay { .. } => DEFAULT_LISTEN_PORT,
        Command::Agent { .. } => 0,
    };
    let mut host_config = HostConfig::with_default_port(default_port);
    if !cli.listen.is_empty() {
        host_config = host_config.listen_addrs(cli.listen.clone());
    }
    if !cli.announce.is_empty() {
        host_config = host_config.announce_addrs(cli.announce.clone());
    }
    if let Some(hex) = &cli.secret_seed {
        host_config = host_config.secret_seed(parse_seed(hex)?);
    }

    let host = Arc::new(TcpHost::bind(host_config).await.context("failed to bind host")?);
    let directory = Arc::new(FileDirectory::new(&cli.directory));

    eprintln!("tunnel-agent v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Peer ID: {}", host.id());
    for addr in host.addrs() {
        eprintln!("  {addr}");
    }
    eprintln!();

    match cli.command {
        Command::Agent {
            node_name,
            mode,
            relay_name,
            heartbeat_secs,
        } => {
            let mut config = AgentConfig::new(node_name)
                .mode(mode)
                .heartbeat_duration(Duration::from_secs(heartbeat_secs));
            if let Some(name) = relay_name {
                config = config.relay_name(name);
            }
            config.validate().context("invalid agent config")?;

            let handle = Maintainer::new(host.clone(), directory, config).spawn();

            tokio::signal::ctrl_c().await?;
            handle.abort();

            let snapshot = serde_json::to_string(&handle.metrics())?;
            tracing::info!(metrics = %snapshot, "agent stopped");
        }

        Command::Relay { relay_name } => {
            let record = PeerAddrInfo::new(host.id(), host.addrs());
            directory
                .set_peer_addr_info(&relay_name, &record)
                .await
                .with_context(|| format!("failed to publish relay record {relay_name}"))?;
            tracing::info!(
                name = %relay_name,
                path = %cli.directory.display(),
                "relay record published"
            );

            tokio::signal::ctrl_c().await?;
            let peers = host.connected_peers().await;
            tracing::info!(connected = peers.len(), "relay stopped");
        }
    }

    Ok(())
}

fn parse_seed(hex: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = data_encoding::HEXLOWER_PERMISSIVE
        .decode(hex.trim().as_bytes())
        .context("secret seed must be hex")?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| anyhow::anyhow!("secret seed must be 32 bytes, got {}", b.len()))
}
