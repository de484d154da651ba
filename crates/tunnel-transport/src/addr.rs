//! Address helpers over libp2p multiaddrs, and peer address records.
//!
//! Addresses are rendered as `/ip4/10.0.0.1/tcp/20006/p2p/<peer>/p2p-circuit`.
//! Only `/ip4|ip6|dns|dns4|dns6/<host>/tcp/<port>[/p2p/<peer>]` is dialed
//! directly; relay circuits are published for others to route through.
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub use multiaddr::{Multiaddr, Protocol};
use serde::{Deserialize, Serialize};

use crate::PeerId;

/// Errors produced while composing relay circuit addresses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddrError {
    #[error("{0} is already a relay circuit")]
    AlreadyCircuit(Multiaddr),

    #[error("{addr} is pinned to {pinned}, not relay {relay}")]
    PinnedToOtherPeer {
        addr: Multiaddr,
        pinned: PeerId,
        relay: PeerId,
    },
}

/// True when the address routes through a relay.
pub fn is_circuit(addr: &Multiaddr) -> bool {
    addr.iter().any(|p| matches!(p, Protocol::P2pCircuit))
}

/// The last `/p2p/<id>` component, if any.
pub fn peer_id(addr: &Multiaddr) -> Option<PeerId> {
    addr.iter()
        .filter_map(|p| match p {
            Protocol::P2p(id) => Some(id),
            _ => None,
        })
        .last()
}

/// Address at which `relay` forwards to the peer publishing it.
///
/// A plain relay address gains `/p2p/<relay>/p2p-circuit`. One already
/// pinned to the relay only gains `/p2p-circuit`. Circuits and addresses
/// pinned to some other peer cannot be routed through this relay.
pub fn relay_circuit(addr: &Multiaddr, relay: PeerId) -> Result<Multiaddr, AddrError> {
    if is_circuit(addr) {
        return Err(AddrError::AlreadyCircuit(addr.clone()));
    }
    match addr.iter().last() {
        Some(Protocol::P2p(pinned)) if pinned == relay => {
            Ok(addr.clone().with(Protocol::P2pCircuit))
        }
        Some(Protocol::P2p(pinned)) => Err(AddrError::PinnedToOtherPeer {
            addr: addr.clone(),
            pinned,
            relay,
        }),
        _ => Ok(addr
            .clone()
            .with(Protocol::P2p(relay))
            .with(Protocol::P2pCircuit)),
    }
}

/// `/ip4|ip6/<ip>/tcp/<port>` for a socket address.
pub fn socket_multiaddr(sock: SocketAddr) -> Multiaddr {
    Multiaddr::empty()
        .with(Protocol::from(sock.ip()))
        .with(Protocol::Tcp(sock.port()))
}

/// Where to open a TCP connection for a directly dialable address.
///
/// `None` for circuits, UDP and anything else that is not
/// `<host>/tcp/<port>` optionally followed by `/p2p/<id>`.
pub fn dial_target(addr: &Multiaddr) -> Option<DialTarget> {
    let mut iter = addr.iter();
    let host = match iter.next()? {
        Protocol::Ip4(ip) => DialHost::Ip(IpAddr::V4(ip)),
        Protocol::Ip6(ip) => DialHost::Ip(IpAddr::V6(ip)),
        Protocol::Dns(name) => DialHost::Dns(name.into_owned()),
        Protocol::Dns4(name) => DialHost::Dns4(name.into_owned()),
        Protocol::Dns6(name) => DialHost::Dns6(name.into_owned()),
        _ => return None,
    };
    let port = match iter.next()? {
        Protocol::Tcp(port) => port,
        _ => return None,
    };
    let peer = match iter.next() {
        None => None,
        Some(Protocol::P2p(id)) => Some(id),
        Some(_) => return None,
    };
    if iter.next().is_some() {
        return None;
    }
    Some(DialTarget { host, port, peer })
}

/// A directly dialable TCP endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialTarget {
    pub host: DialHost,
    pub port: u16,
    /// Identity the address is pinned to, if any.
    pub peer: Option<PeerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialHost {
    Ip(IpAddr),
    /// Any address family.
    Dns(String),
    Dns4(String),
    Dns6(String),
}

impl fmt::Display for DialTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            DialHost::Ip(ip) => write!(f, "{}", SocketAddr::new(*ip, self.port)),
            DialHost::Dns(name) | DialHost::Dns4(name) | DialHost::Dns6(name) => {
                write!(f, "{name}:{}", self.port)
            }
        }
    }
}

/// A peer's identity plus every address it can be reached at.
///
/// Serialized as `{"ID": "...", "Addrs": ["/ip4/..."]}`. An empty
/// `addrs` list means the peer's location is not yet known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAddrInfo {
    #[serde(rename = "ID")]
    pub id: PeerId,
    #[serde(rename = "Addrs", default)]
    pub addrs: Vec<Multiaddr>,
}

impl PeerAddrInfo {
    pub fn new(id: PeerId, addrs: Vec<Multiaddr>) -> Self {
        Self { id, addrs }
    }

    /// True when no address is known for the peer.
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }
}
