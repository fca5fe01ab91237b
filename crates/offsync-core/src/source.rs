// ── External collaborator contracts ──
//
// The host application supplies these. The sync layer only ever talks
// to the network, blob storage, and disk through them.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::RemoteError;
use crate::model::{FilterSpec, RecordDraft, RecordId, SyncRecord};
use crate::persist::KvError;

/// Reports current network reachability.
///
/// Sampled once at the start of every coordinator operation and never
/// cached across operations. There is no error path: an implementation
/// that cannot decide must answer `false`.
#[async_trait]
pub trait ConnectivityMonitor: Send + Sync {
    async fn currently_connected(&self) -> bool;
}

/// The remote store holding the source of truth for records of type `R`.
#[async_trait]
pub trait RemoteDataSource<R: SyncRecord>: Send + Sync {
    async fn list(&self, filter: &FilterSpec) -> Result<Vec<R>, RemoteError>;

    /// Existence check used before update and delete. Absent is `Ok(None)`.
    async fn get(&self, id: &RecordId) -> Result<Option<R>, RemoteError>;

    async fn create(&self, draft: RecordDraft<R::Fields>) -> Result<R, RemoteError>;

    async fn update(&self, id: &RecordId, draft: RecordDraft<R::Fields>)
    -> Result<R, RemoteError>;

    async fn delete(&self, id: &RecordId) -> Result<(), RemoteError>;
}

/// Attachment blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `name`, returning the URL the record links to.
    async fn upload(
        &self,
        bytes: Bytes,
        name: &str,
        content_type: Option<&str>,
    ) -> Result<String, RemoteError>;

    async fn delete(&self, url: &str) -> Result<(), RemoteError>;
}

/// Persisted key-value storage shared by the cache and preferences.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, KvError>;
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), KvError>;
    /// Removing an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<(), KvError>;
    async fn keys(&self) -> Result<Vec<String>, KvError>;
}

// ── Fixed connectivity ───────────────────────────────────────────────

/// Connectivity decided by the host rather than probed. Backs the CLI's
/// `--offline` flag and test doubles.
#[derive(Debug)]
pub struct StaticConnectivity {
    connected: AtomicBool,
}

impl StaticConnectivity {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityMonitor for StaticConnectivity {
    async fn currently_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_connectivity_can_flip() {
        let monitor = StaticConnectivity::online();
        assert!(monitor.currently_connected().await);
        monitor.set_connected(false);
        assert!(!monitor.currently_connected().await);
    }
}
