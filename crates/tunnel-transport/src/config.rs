use std::time::Duration;

use crate::addr::socket_multiaddr;
use crate::Multiaddr;

/// Default port a relay listens on.
pub const DEFAULT_LISTEN_PORT: u16 = 20006;

/// Configuration for a [`TcpHost`](crate::TcpHost).
///
/// All fields have sensible defaults. Use the builder pattern:
///
/// ```rust
/// use std::time::Duration;
/// use tunnel_transport::HostConfig;
///
/// let config = HostConfig::new()
///     .listen_addrs(vec!["/ip4/127.0.0.1/tcp/0".parse().unwrap()])
///     .dial_timeout(Duration::from_secs(3));
/// ```
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Addresses to accept inbound connections on.
    pub(crate) listen_addrs: Vec<Multiaddr>,
    /// Addresses to advertise instead of the bound ones (NAT mappings, DNS).
    pub(crate) announce_addrs: Vec<Multiaddr>,
    /// Upper bound for a single TCP connect.
    pub(crate) dial_timeout: Duration,
    /// Upper bound for the hello exchange after the socket is open.
    pub(crate) handshake_timeout: Duration,
    /// Largest hello frame accepted from a peer.
    pub(crate) max_handshake_size: usize,
    /// Ed25519 secret seed. A random identity is generated when unset.
    pub(crate) secret_seed: Option<[u8; 32]>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HostConfig {
    /// Create a new config listening on all interfaces at
    /// [`DEFAULT_LISTEN_PORT`].
    pub fn new() -> Self {
        Self::with_default_port(DEFAULT_LISTEN_PORT)
    }

    /// Create a new config listening on all interfaces at `port`.
    /// Port 0 picks an ephemeral port.
    ///
    /// If the `TUNNEL_LISTEN_ADDR` environment variable holds a valid
    /// multiaddr, it replaces the default listen address. This can be
    /// overridden with [`.listen_addrs()`](Self::listen_addrs).
    pub fn with_default_port(port: u16) -> Self {
        let listen = std::env::var("TUNNEL_LISTEN_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| default_listen_addr(port));

        Self {
            listen_addrs: vec![listen],
            announce_addrs: Vec::new(),
            dial_timeout: Duration::from_secs(10),
            handshake_timeout: Duration::from_secs(5),
            max_handshake_size: 1024,
            secret_seed: None,
        }
    }

    /// Replace the listen addresses. An empty list makes the host dial-only.
    pub fn listen_addrs(mut self, addrs: Vec<Multiaddr>) -> Self {
        self.listen_addrs = addrs;
        self
    }

    /// Advertise these addresses from `addrs()` instead of the bound ones.
    pub fn announce_addrs(mut self, addrs: Vec<Multiaddr>) -> Self {
        self.announce_addrs = addrs;
        self
    }

    /// Set the per-address connect timeout (default: 10 s).
    pub fn dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    /// Set the hello exchange timeout (default: 5 s).
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set the maximum hello frame size (default: 1 KiB).
    pub fn max_handshake_size(mut self, bytes: usize) -> Self {
        self.max_handshake_size = bytes;
        self
    }

    /// Use a fixed identity instead of a random one.
    pub fn secret_seed(mut self, seed: [u8; 32]) -> Self {
        self.secret_seed = Some(seed);
        self
    }
}

fn default_listen_addr(port: u16) -> Multiaddr {
    socket_multiaddr(std::net::SocketAddr::from(([0, 0, 0, 0], port)))
}
