use std::time::Duration;

use crate::error::ConfigError;
use crate::types::{
    AgentMode, HEARTBEAT_DURATION, RESOLVE_BACKOFF, RETRY_CONNECT_DURATION, RETRY_CONNECT_TIME,
    SERVER_ADDR_NAME,
};

/// Configuration for the connectivity [`Maintainer`](crate::Maintainer).
///
/// ```rust
/// use std::time::Duration;
/// use tunnel_agent::{AgentConfig, AgentMode};
///
/// let config = AgentConfig::new("edge-node-1")
///     .mode(AgentMode::ClientOnly)
///     .heartbeat_duration(Duration::from_secs(30));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Directory key the agent's own record is published under.
    pub node_name: String,
    pub mode: AgentMode,
    /// Directory key of the relay's record.
    pub relay_name: String,
    /// Dial attempts per cycle.
    pub retry_connect_time: u32,
    /// Delay after each failed attempt.
    pub retry_connect_duration: Duration,
    /// Delay between cycles.
    pub heartbeat_duration: Duration,
    /// Delay before retrying a failed relay lookup.
    pub resolve_backoff: Duration,
}

impl AgentConfig {
    /// Create a config with defaults for the given node name.
    ///
    /// If the `TUNNEL_RELAY_NAME` environment variable is set, it replaces
    /// the default relay record name. This can be overridden with
    /// [`.relay_name()`](Self::relay_name).
    pub fn new(node_name: impl Into<String>) -> Self {
        let relay_name = std::env::var("TUNNEL_RELAY_NAME")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SERVER_ADDR_NAME.to_string());

        Self {
            node_name: node_name.into(),
            mode: AgentMode::ServerClient,
            relay_name,
            retry_connect_time: RETRY_CONNECT_TIME,
            retry_connect_duration: RETRY_CONNECT_DURATION,
            heartbeat_duration: HEARTBEAT_DURATION,
            resolve_backoff: RESOLVE_BACKOFF,
        }
    }

    pub fn mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn relay_name(mut self, name: impl Into<String>) -> Self {
        self.relay_name = name.into();
        self
    }

    /// Set the dial attempts per cycle (default: 3).
    pub fn retry_connect_time(mut self, attempts: u32) -> Self {
        self.retry_connect_time = attempts;
        self
    }

    /// Set the delay after a failed attempt (default: 2 s).
    pub fn retry_connect_duration(mut self, delay: Duration) -> Self {
        self.retry_connect_duration = delay;
        self
    }

    /// Set the delay between cycles (default: 10 s).
    pub fn heartbeat_duration(mut self, delay: Duration) -> Self {
        self.heartbeat_duration = delay;
        self
    }

    /// Set the delay after a failed relay lookup (default: 5 s).
    pub fn resolve_backoff(mut self, delay: Duration) -> Self {
        self.resolve_backoff = delay;
        self
    }

    /// Reject configs the maintainer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_name.trim().is_empty() {
            return Err(ConfigError::EmptyNodeName);
        }
        if self.relay_name.trim().is_empty() {
            return Err(ConfigError::EmptyRelayName);
        }
        Ok(())
    }
}
