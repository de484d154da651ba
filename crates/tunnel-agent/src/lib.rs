//! Edge tunnel agent.
//!
//! Keeps an edge node attached to its relay: resolves the relay's address
//! record from a shared directory, probes for a live connection, redials
//! with a bounded retry budget when it is gone, and (in server-client mode)
//! publishes the node's own relay-circuit addresses so others can reach it
//! through the relay.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tunnel_agent::{AgentConfig, AgentMode, FileDirectory, Maintainer};
//! use tunnel_transport::{HostConfig, TcpHost};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let host = Arc::new(TcpHost::bind(HostConfig::with_default_port(0)).await?);
//! let directory = Arc::new(FileDirectory::new("/var/lib/tunnel/peers.json"));
//! let config = AgentConfig::new("edge-node-1").mode(AgentMode::ServerClient);
//!
//! let handle = Maintainer::new(host, directory, config).spawn();
//! // ... later, on shutdown:
//! println!("{:?}", handle.metrics());
//! handle.abort();
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod config;
pub mod connector;
pub mod directory;
pub mod error;
pub mod host;
pub mod maintainer;
pub mod metrics;
pub mod prober;
pub mod publisher;
pub mod resolver;
pub mod types;

pub use circuit::info_from_host_and_relay;
pub use config::AgentConfig;
pub use connector::RetryBudget;
pub use directory::{FileDirectory, MemoryDirectory, PeerDirectory};
pub use error::{ConfigError, DirectoryError, TunnelError};
pub use host::Host;
pub use maintainer::{
    Clock, Maintainer, MaintainerEffect, MaintainerEvent, MaintainerHandle, MaintainerState,
    Outcome, Phase, TokioClock,
};
pub use metrics::{MaintainerMetrics, MetricsSnapshot};
pub use types::{
    AgentMode, HEARTBEAT_DURATION, RESOLVE_BACKOFF, RETRY_CONNECT_DURATION, RETRY_CONNECT_TIME,
    SERVER_ADDR_NAME,
};
