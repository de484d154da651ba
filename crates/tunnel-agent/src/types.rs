use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Dial attempts per maintenance cycle.
pub const RETRY_CONNECT_TIME: u32 = 3;

/// Constant delay after a failed dial or publish attempt.
pub const RETRY_CONNECT_DURATION: Duration = Duration::from_secs(2);

/// Delay between maintenance cycles.
pub const HEARTBEAT_DURATION: Duration = Duration::from_secs(10);

/// Delay before retrying a failed relay lookup.
pub const RESOLVE_BACKOFF: Duration = Duration::from_secs(5);

/// Well-known directory name of the relay's address record.
pub const SERVER_ADDR_NAME: &str = "server_addr";

/// Operating mode, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentMode {
    /// The agent must itself be dialable by others through the relay,
    /// so it publishes its relay-circuit addresses.
    #[serde(rename = "ServerClientMode")]
    ServerClient,
    /// The agent only dials out; nothing is published.
    #[serde(rename = "ClientOnlyMode")]
    ClientOnly,
}

impl AgentMode {
    /// Whether this mode publishes the agent's own address record.
    pub fn publishes_self(&self) -> bool {
        matches!(self, AgentMode::ServerClient)
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentMode::ServerClient => write!(f, "server-client"),
            AgentMode::ClientOnly => write!(f, "client-only"),
        }
    }
}

impl FromStr for AgentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server-client" | "ServerClientMode" => Ok(AgentMode::ServerClient),
            "client-only" | "ClientOnlyMode" => Ok(AgentMode::ClientOnly),
            other => Err(format!(
                "unknown mode {other:?} (expected server-client or client-only)"
            )),
        }
    }
}
