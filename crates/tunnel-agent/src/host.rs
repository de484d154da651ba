use tunnel_transport::{ConnectionInfo, Multiaddr, PeerAddrInfo, PeerId, TransportError};

/// Transport host as seen by the maintainer.
///
/// In production: implemented by `TcpHost`.
/// In tests: implemented by `MockHost` (scripted dials, recorded calls).
#[async_trait::async_trait]
pub trait Host: Send + Sync {
    /// Local identity.
    fn id(&self) -> PeerId;

    /// Local directly dialable addresses.
    fn addrs(&self) -> Vec<Multiaddr>;

    /// Established connections to `peer`.
    async fn conns_to_peer(&self, peer: &PeerId) -> Vec<ConnectionInfo>;

    /// Dial `info` until one of its addresses connects.
    async fn connect(&self, info: &PeerAddrInfo) -> Result<(), TransportError>;
}

// ── Impl for TcpHost (production) ───────────────────────────────────

#[async_trait::async_trait]
impl Host for tunnel_transport::TcpHost {
    fn id(&self) -> PeerId {
        tunnel_transport::TcpHost::id(self)
    }

    fn addrs(&self) -> Vec<Multiaddr> {
        tunnel_transport::TcpHost::addrs(self)
    }

    async fn conns_to_peer(&self, peer: &PeerId) -> Vec<ConnectionInfo> {
        tunnel_transport::TcpHost::conns_to_peer(self, peer).await
    }

    async fn connect(&self, info: &PeerAddrInfo) -> Result<(), TransportError> {
        tunnel_transport::TcpHost::connect(self, info).await
    }
}

// ── MockHost (tests) ────────────────────────────────────────────────
