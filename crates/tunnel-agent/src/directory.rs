//! Peer directory: the shared store of name to address records.
//!
//! The maintainer only sees the [`PeerDirectory`] trait. Two stores ship
//! with the crate: [`MemoryDirectory`] for single-process setups and
//! [`FileDirectory`], a JSON document that several processes on one
//! machine (or a mounted volume) can share.
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tunnel_transport::PeerAddrInfo;

use crate::error::DirectoryError;

/// Name-keyed store of peer address records.
#[async_trait::async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Fetch the record stored under `name`.
    async fn get_peer_addr_info(&self, name: &str) -> Result<PeerAddrInfo, DirectoryError>;

    /// Store `info` under `name`, replacing any previous record.
    async fn set_peer_addr_info(&self, name: &str, info: &PeerAddrInfo) -> Result<(), DirectoryError>;
}

// ── In-memory ───────────────────────────────────────────────────────

/// In-process directory. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    records: Arc<RwLock<HashMap<String, PeerAddrInfo>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl PeerDirectory for MemoryDirectory {
    async fn get_peer_addr_info(&self, name: &str) -> Result<PeerAddrInfo, DirectoryError> {
        let records = self
            .records
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".into()))?;
        records
            .get(name)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))
    }

    async fn set_peer_addr_info(&self, name: &str, info: &PeerAddrInfo) -> Result<(), DirectoryError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".into()))?;
        records.insert(name.to_string(), info.clone());
        Ok(())
    }
}

// ── File-backed ─────────────────────────────────────────────────────

/// Directory stored as one JSON object: `{"<name>": {"ID": ..., "Addrs": [...]}}`.
///
/// Every lookup re-reads the file. Writes are read-modify-write under an
/// advisory lock on `<path>.lock`, so handles in any number of processes
/// can publish into the same file without losing each other's records.
/// The new document lands through a uniquely named temp file and an
/// atomic rename, so readers never see a partial write.
pub struct FileDirectory {
    path: PathBuf,
}

impl FileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, PeerAddrInfo>, DirectoryError> {
        parse_records(tokio::fs::read(&self.path).await)
    }
}

#[async_trait::async_trait]
impl PeerDirectory for FileDirectory {
    async fn get_peer_addr_info(&self, name: &str) -> Result<PeerAddrInfo, DirectoryError> {
        let mut records = self.load().await?;
        records
            .remove(name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))
    }

    async fn set_peer_addr_info(&self, name: &str, info: &PeerAddrInfo) -> Result<(), DirectoryError> {
        let path = self.path.clone();
        let key = name.to_string();
        let record = info.clone();
        tokio::task::spawn_blocking(move || write_record(&path, key, record))
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("directory writer failed: {e}")))??;

        tracing::debug!(path = %self.path.display(), %name, "directory record written");
        Ok(())
    }
}

fn parse_records(
    read: std::io::Result<Vec<u8>>,
) -> Result<BTreeMap<String, PeerAddrInfo>, DirectoryError> {
    match read {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut lock = path.as_os_str().to_owned();
    lock.push(".lock");
    PathBuf::from(lock)
}

/// Blocking read-modify-write of one record, serialized across processes.
fn write_record(path: &Path, name: String, info: PeerAddrInfo) -> Result<(), DirectoryError> {
    let lock_file = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _guard = lock.write()?;

    let mut records = parse_records(std::fs::read(path))?;
    records.insert(name, info);
    let json = serde_json::to_vec_pretty(&records)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ── MockDirectory (tests) ───────────────────────────────────────────
