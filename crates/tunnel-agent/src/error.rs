use tunnel_transport::{PeerId, TransportError};

/// Failures of one maintenance step.
///
/// None of these are fatal: each one degrades to "try again", either
/// after the resolve backoff or within the cycle's retry budget.
#[derive(Debug, thiserror::Error)]
pub enum TunnelError {
    #[error("failed to resolve relay {name}: {source}")]
    Resolution {
        name: String,
        #[source]
        source: DirectoryError,
    },

    #[error("relay record {name} has no addresses")]
    EmptyRecord { name: String },

    #[error("connect to relay {peer} failed: {source}")]
    Dial {
        peer: PeerId,
        #[source]
        source: TransportError,
    },

    #[error("publish of {node_name} failed: {source}")]
    Publish {
        node_name: String,
        #[source]
        source: DirectoryError,
    },
}

/// Errors from the peer directory.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("no record named {0}")]
    NotFound(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("directory i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Agent configurations the maintainer cannot run with.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("node name must not be empty")]
    EmptyNodeName,

    #[error("relay name must not be empty")]
    EmptyRelayName,
}
