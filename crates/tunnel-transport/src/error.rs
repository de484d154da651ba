use crate::{AddrError, PeerId};

/// Errors returned by the tunnel transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dial to {peer} at {addr} failed: {source}")]
    Dial {
        peer: PeerId,
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dial to {peer} at {addr} timed out")]
    Timeout { peer: PeerId, addr: String },

    #[error("handshake with {addr} failed: {reason}")]
    Handshake { addr: String, reason: String },

    #[error("expected peer {expected} but {actual} answered")]
    PeerMismatch { expected: PeerId, actual: PeerId },

    #[error("no directly dialable address for {0}")]
    NoDialableAddress(PeerId),

    #[error("refusing to dial own identity")]
    DialSelf,

    #[error("failed to resolve {name}: {reason}")]
    Resolve { name: String, reason: String },

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddrError),

    #[error("invalid identity: {0}")]
    InvalidIdentity(String),
}
