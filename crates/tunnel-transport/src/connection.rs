use crate::PeerId;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Which side opened the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Snapshot of one established connection.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: u64,
    pub peer: PeerId,
    pub remote_addr: SocketAddr,
    pub direction: Direction,
    pub opened_at: Instant,
}

struct TrackedConnection {
    info: ConnectionInfo,
    // Held so the socket stays open until the connection is dropped.
    _writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

/// Live connections per peer.
///
/// Every registered connection gets a reader task that drains the socket
/// until EOF or error and then unregisters it, so connections that drop
/// silently vanish from `conns_to_peer` without polling.
pub(crate) struct ConnectionPool {
    next_id: AtomicU64,
    connections: Mutex<HashMap<PeerId, Vec<TrackedConnection>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Take ownership of a handshaken stream and start watching it.
    pub async fn register(
        self: &Arc<Self>,
        peer: PeerId,
        stream: TcpStream,
        direction: Direction,
    ) -> std::io::Result<ConnectionInfo> {
        let remote_addr = stream.peer_addr()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let info = ConnectionInfo {
            id,
            peer,
            remote_addr,
            direction,
            opened_at: Instant::now(),
        };

        let (mut read_half, writer) = stream.into_split();
        let pool = Arc::downgrade(self);

        // The reader's `forget` takes this lock, so it cannot run before
        // the entry is pushed even if the remote is already gone.
        let mut conns = self.connections.lock().await;
        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }
            tracing::debug!(%peer, conn = id, "connection closed by remote");
            if let Some(pool) = pool.upgrade() {
                pool.forget(&peer, id).await;
            }
        });
        conns.entry(peer).or_default().push(TrackedConnection {
            info: info.clone(),
            _writer: writer,
            reader,
        });
        Ok(info)
    }

    /// Established connections to `peer`.
    pub async fn conns_to_peer(&self, peer: &PeerId) -> Vec<ConnectionInfo> {
        let conns = self.connections.lock().await;
        conns
            .get(peer)
            .map(|list| {
                list.iter()
                    .filter(|c| !c.reader.is_finished())
                    .map(|c| c.info.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Peers with at least one live connection.
    pub async fn connected_peers(&self) -> Vec<PeerId> {
        let conns = self.connections.lock().await;
        conns
            .iter()
            .filter(|(_, list)| list.iter().any(|c| !c.reader.is_finished()))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop every connection to `peer`.
    pub async fn close_peer(&self, peer: &PeerId) {
        if let Some(list) = self.connections.lock().await.remove(peer) {
            for conn in list {
                conn.reader.abort();
            }
        }
    }

    /// Drop every connection.
    pub async fn close_all(&self) {
        let drained: Vec<_> = self.connections.lock().await.drain().collect();
        for (_, list) in drained {
            for conn in list {
                conn.reader.abort();
            }
        }
    }

    async fn forget(&self, peer: &PeerId, conn_id: u64) {
        let mut conns = self.connections.lock().await;
        if let Some(list) = conns.get_mut(peer) {
            list.retain(|c| c.info.id != conn_id);
            if list.is_empty() {
                conns.remove(peer);
            }
        }
    }
}
