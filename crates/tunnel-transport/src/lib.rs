//! Edge tunnel transport layer.
//!
//! libp2p peer identities, multiaddr helpers and a TCP host that
//! dials peers, tracks live connections per identity and accepts
//! inbound agents.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tunnel_transport::{HostConfig, PeerAddrInfo, TcpHost};
//!
//! # async fn example(relay: PeerAddrInfo) -> Result<(), tunnel_transport::TransportError> {
//! let host = TcpHost::bind(HostConfig::new()).await?;
//! println!("My ID: {}", host.id());
//!
//! host.connect(&relay).await?;
//! assert!(!host.conns_to_peer(&relay.id).await.is_empty());
//!
//! host.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod addr;
mod config;
mod connection;
mod error;
mod handshake;
mod host;
pub mod identity;

pub use addr::{
    dial_target, is_circuit, peer_id, relay_circuit, socket_multiaddr, AddrError, DialHost,
    DialTarget, Multiaddr, PeerAddrInfo, Protocol,
};
pub use config::{HostConfig, DEFAULT_LISTEN_PORT};
pub use connection::{ConnectionInfo, Direction};
pub use error::TransportError;
pub use host::TcpHost;
pub use identity::{Keypair, PeerId};
