use crate::addr::{dial_target, socket_multiaddr, DialHost, DialTarget};
use crate::config::HostConfig;
use crate::connection::{ConnectionInfo, ConnectionPool, Direction};
use crate::handshake;
use crate::identity::{self, Keypair};
use crate::{Multiaddr, PeerAddrInfo, PeerId, TransportError};

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;

/// A tunnel transport host. Listens, dials and tracks connections per peer.
///
/// Connections are plain TCP with an identity hello exchanged on open.
/// Every connection is tracked until the remote closes it.
pub struct TcpHost {
    id: PeerId,
    listen_addrs: Vec<Multiaddr>,
    announce_addrs: Vec<Multiaddr>,
    pool: Arc<ConnectionPool>,
    accept_tasks: Vec<JoinHandle<()>>,
    resolver: OnceCell<TokioAsyncResolver>,
    config: HostConfig,
}

impl TcpHost {
    /// Create the host and start listening.
    ///
    /// Derives the identity from the configured seed (or generates a fresh
    /// one) and binds every listen address. Listen addresses must have the
    /// shape `/ip4|ip6/<addr>/tcp/<port>`.
    pub async fn bind(config: HostConfig) -> Result<Self, TransportError> {
        let keypair = match config.secret_seed {
            Some(seed) => identity::keypair_from_seed(seed)?,
            None => Keypair::generate_ed25519(),
        };
        let id = keypair.public().to_peer_id();
        let pool = Arc::new(ConnectionPool::new());

        let mut listen_addrs = Vec::with_capacity(config.listen_addrs.len());
        let mut accept_tasks = Vec::with_capacity(config.listen_addrs.len());
        for addr in &config.listen_addrs {
            let sock = listen_socket_addr(addr)?;
            let listener = TcpListener::bind(sock)
                .await
                .map_err(|source| TransportError::Bind {
                    addr: addr.to_string(),
                    source,
                })?;
            let bound = listener.local_addr().map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
            let bound = socket_multiaddr(bound);
            tracing::info!(%id, addr = %bound, "listening");

            listen_addrs.push(bound);
            accept_tasks.push(tokio::spawn(accept_loop(
                listener,
                id,
                pool.clone(),
                config.clone(),
            )));
        }

        Ok(Self {
            id,
            announce_addrs: config.announce_addrs.clone(),
            listen_addrs,
            pool,
            accept_tasks,
            resolver: OnceCell::new(),
            config,
        })
    }

    /// This host's identity.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Addresses other peers can dial this host at.
    ///
    /// The announce override when configured, otherwise the bound
    /// listen addresses with wildcard IPs replaced by the current
    /// interface addresses.
    pub fn addrs(&self) -> Vec<Multiaddr> {
        if self.announce_addrs.is_empty() {
            expand_unspecified(&self.listen_addrs)
        } else {
            self.announce_addrs.clone()
        }
    }

    /// Established connections to `peer`.
    pub async fn conns_to_peer(&self, peer: &PeerId) -> Vec<ConnectionInfo> {
        self.pool.conns_to_peer(peer).await
    }

    /// List all currently connected peers.
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        self.pool.connected_peers().await
    }

    /// Ensure a connection to `info.id` exists.
    ///
    /// A no-op when one is already open. Otherwise every directly dialable
    /// address is tried in record order until one connects and passes the
    /// hello exchange.
    pub async fn connect(&self, info: &PeerAddrInfo) -> Result<(), TransportError> {
        if info.id == self.id {
            return Err(TransportError::DialSelf);
        }
        if !self.pool.conns_to_peer(&info.id).await.is_empty() {
            return Ok(());
        }

        let mut last_err = None;
        for addr in &info.addrs {
            let Some(target) = dial_target(addr) else {
                tracing::debug!(peer = %info.id, %addr, "skipping non-dialable address");
                continue;
            };
            if target.peer.is_some_and(|p| p != info.id) {
                tracing::debug!(peer = %info.id, %addr, "skipping address pinned to another peer");
                continue;
            }

            match self.dial(info.id, &target).await {
                Ok(conn) => {
                    tracing::debug!(peer = %info.id, remote = %conn.remote_addr, conn = conn.id, "connected");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(peer = %info.id, %addr, "dial failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(TransportError::NoDialableAddress(info.id)))
    }

    /// Force-close every connection to `peer`.
    pub async fn disconnect(&self, peer: &PeerId) {
        self.pool.close_peer(peer).await;
    }

    /// Graceful shutdown: stop accepting and drop all connections.
    pub async fn shutdown(self) {
        for task in &self.accept_tasks {
            task.abort();
        }
        self.pool.close_all().await;
    }

    async fn dial(&self, peer: PeerId, target: &DialTarget) -> Result<ConnectionInfo, TransportError> {
        let addr = target.to_string();
        let sockets = self.resolve(target).await?;

        let mut last_err = None;
        for sock in sockets {
            let connect = tokio::time::timeout(self.config.dial_timeout, TcpStream::connect(sock));
            let mut stream = match connect.await {
                Ok(Ok(stream)) => stream,
                Ok(Err(source)) => {
                    last_err = Some(TransportError::Dial {
                        peer,
                        addr: addr.clone(),
                        source,
                    });
                    continue;
                }
                Err(_) => {
                    last_err = Some(TransportError::Timeout {
                        peer,
                        addr: addr.clone(),
                    });
                    continue;
                }
            };

            let hello = handshake::dialer_hello(
                &mut stream,
                &self.id,
                &peer,
                self.config.max_handshake_size,
                &addr,
            );
            match tokio::time::timeout(self.config.handshake_timeout, hello).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    return Err(TransportError::Handshake {
                        addr,
                        reason: "timed out".into(),
                    })
                }
            }

            return self
                .pool
                .register(peer, stream, Direction::Outbound)
                .await
                .map_err(|source| TransportError::Dial { peer, addr, source });
        }

        Err(last_err.unwrap_or(TransportError::Resolve {
            name: addr,
            reason: "no addresses".into(),
        }))
    }

    async fn resolve(&self, target: &DialTarget) -> Result<Vec<SocketAddr>, TransportError> {
        let name = match &target.host {
            DialHost::Ip(ip) => return Ok(vec![SocketAddr::new(*ip, target.port)]),
            DialHost::Dns(name) | DialHost::Dns4(name) | DialHost::Dns6(name) => name.as_str(),
        };

        let resolver = self
            .resolver
            .get_or_init(|| async {
                TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
                    tracing::debug!("system resolver config unavailable ({e}), using defaults");
                    TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
                })
            })
            .await;

        let lookup = resolver
            .lookup_ip(name)
            .await
            .map_err(|e| TransportError::Resolve {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(lookup
            .iter()
            .filter(|ip| match target.host {
                DialHost::Dns4(_) => ip.is_ipv4(),
                DialHost::Dns6(_) => ip.is_ipv6(),
                _ => true,
            })
            .map(|ip| SocketAddr::new(ip, target.port))
            .collect())
    }
}

impl Drop for TcpHost {
    fn drop(&mut self) {
        for task in &self.accept_tasks {
            task.abort();
        }
    }
}

/// Replace `0.0.0.0` and `::` listen addresses with one address per
/// interface of the same family. Other addresses pass through.
fn expand_unspecified(addrs: &[Multiaddr]) -> Vec<Multiaddr> {
    let mut interfaces: Option<Vec<IpAddr>> = None;
    let mut out = Vec::with_capacity(addrs.len());
    for addr in addrs {
        let (ip, port) = match dial_target(addr) {
            Some(DialTarget {
                host: DialHost::Ip(ip),
                port,
                ..
            }) if ip.is_unspecified() => (ip, port),
            _ => {
                out.push(addr.clone());
                continue;
            }
        };
        let ips = interfaces.get_or_insert_with(interface_ips);
        out.extend(
            ips.iter()
                .filter(|i| i.is_ipv4() == ip.is_ipv4())
                .map(|i| socket_multiaddr(SocketAddr::new(*i, port))),
        );
    }
    out
}

fn interface_ips() -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .map(|iface| iface.ip())
            .filter(|ip| !is_ipv6_link_local(ip))
            .collect(),
        Err(e) => {
            tracing::warn!("cannot list network interfaces, wildcard listen addresses not advertised: {e}");
            Vec::new()
        }
    }
}

// fe80::/10 needs a scope id to be dialed, which a multiaddr cannot carry.
fn is_ipv6_link_local(ip: &IpAddr) -> bool {
    matches!(ip, IpAddr::V6(v6) if v6.segments()[0] & 0xffc0 == 0xfe80)
}

fn listen_socket_addr(addr: &Multiaddr) -> Result<SocketAddr, TransportError> {
    match dial_target(addr) {
        Some(DialTarget {
            host: DialHost::Ip(ip),
            port,
            peer: None,
        }) => Ok(SocketAddr::new(ip, port)),
        _ => Err(TransportError::Bind {
            addr: addr.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "listen address must be /ip4|ip6/<addr>/tcp/<port>",
            ),
        }),
    }
}

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

async fn accept_loop(listener: TcpListener, local: PeerId, pool: Arc<ConnectionPool>, config: HostConfig) {
    loop {
        let (mut stream, remote) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                // Out of file descriptors and similar: back off instead of spinning.
                tracing::warn!("accept failed: {e}");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                continue;
            }
        };

        let pool = pool.clone();
        let timeout = config.handshake_timeout;
        let max_size = config.max_handshake_size;
        tokio::spawn(async move {
            let addr = remote.to_string();
            let hello = handshake::acceptor_hello(&mut stream, &local, max_size, &addr);
            let peer = match tokio::time::timeout(timeout, hello).await {
                Ok(Ok(peer)) => peer,
                Ok(Err(e)) => {
                    tracing::debug!(%remote, "inbound handshake failed: {e}");
                    return;
                }
                Err(_) => {
                    tracing::debug!(%remote, "inbound handshake timed out");
                    return;
                }
            };
            match pool.register(peer, stream, Direction::Inbound).await {
                Ok(conn) => tracing::info!(%peer, %remote, conn = conn.id, "accepted connection"),
                Err(e) => tracing::debug!(%peer, %remote, "failed to register connection: {e}"),
            }
        });
    }
}
