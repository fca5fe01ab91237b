// ── Sync coordination ──
//
// Every operation follows the same outer decision order: sample
// connectivity, then either consult the cache (reads while offline) or
// fail fast (writes while offline), else go to the remote store.
// Nothing here is retried, queued, deduplicated, or cancelled.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::CacheStore;
use crate::error::CoreError;
use crate::model::{Attachment, FilterSpec, NewRecord, RecordChanges, RecordDraft, RecordId, SyncRecord};
use crate::source::{BlobStore, ConnectivityMonitor, RemoteDataSource};

/// Result of a successful list fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<R> {
    pub records: Vec<R>,
    /// `true` when `records` came from a fresh offline cache snapshot.
    pub is_offline: bool,
}

/// Resolves one logical operation against connectivity, cache, and remote.
pub struct SyncCoordinator<R: SyncRecord> {
    connectivity: Arc<dyn ConnectivityMonitor>,
    remote: Arc<dyn RemoteDataSource<R>>,
    blobs: Arc<dyn BlobStore>,
    cache: Arc<CacheStore>,
}

impl<R: SyncRecord> SyncCoordinator<R> {
    pub fn new(
        connectivity: Arc<dyn ConnectivityMonitor>,
        remote: Arc<dyn RemoteDataSource<R>>,
        blobs: Arc<dyn BlobStore>,
        cache: Arc<CacheStore>,
    ) -> Self {
        Self {
            connectivity,
            remote,
            blobs,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch the records matching `filter`.
    ///
    /// Offline: serve a fresh cached snapshot, or fail with
    /// [`CoreError::NoConnectivity`]; a stale snapshot is never served.
    /// Online: query the remote store and write the result through to
    /// the cache. A remote failure while online is [`CoreError::Remote`],
    /// not a connectivity problem.
    pub async fn fetch_list(&self, filter: &FilterSpec) -> Result<FetchOutcome<R>, CoreError> {
        let key = self.cache.key_for(filter);

        if !self.connectivity.currently_connected().await {
            debug!(key, "offline, consulting cache");
            let Some(envelope) = self.cache.get::<R>(&key).await else {
                debug!(key, "no cached snapshot");
                return Err(CoreError::NoConnectivity);
            };
            if !self.cache.is_fresh(&envelope) {
                debug!(key, stored_at = %envelope.stored_at, "cached snapshot is stale");
                return Err(CoreError::NoConnectivity);
            }

            info!(count = envelope.data.len(), "serving records from offline cache");
            return Ok(FetchOutcome {
                records: envelope.data,
                is_offline: true,
            });
        }

        let records = self
            .remote
            .list(filter)
            .await
            .map_err(|e| CoreError::from_remote(e, None))?;

        self.cache.put(&key, &records).await;

        info!(count = records.len(), "fetched records from remote");
        Ok(FetchOutcome {
            records,
            is_offline: false,
        })
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Create a record. Attachments are uploaded first, concurrently; the
    /// record write happens only once every upload has succeeded.
    pub async fn create(&self, input: NewRecord<R::Fields>) -> Result<R, CoreError> {
        self.require_connectivity("create").await?;

        let attachments = self.upload_all(input.attachments).await?;
        let draft = RecordDraft {
            fields: input.fields,
            attachments,
        };

        let record = self
            .remote
            .create(draft)
            .await
            .map_err(|e| CoreError::from_remote(e, None))?;

        info!(id = %record.id(), "record created");
        Ok(record)
    }

    /// Update a record. The target must still exist remotely. Blobs
    /// marked for removal are deleted only after the update itself lands.
    pub async fn update(
        &self,
        id: &RecordId,
        changes: RecordChanges<R::Fields>,
    ) -> Result<R, CoreError> {
        self.require_connectivity("update").await?;
        let existing = self.require_existing(id).await?;

        let uploaded = self.upload_all(changes.add_attachments).await?;
        let mut attachments: Vec<String> = existing
            .attachments()
            .iter()
            .filter(|url| !changes.remove_attachments.contains(*url))
            .cloned()
            .collect();
        attachments.extend(uploaded);

        let draft = RecordDraft {
            fields: changes.fields,
            attachments,
        };
        let record = self
            .remote
            .update(id, draft)
            .await
            .map_err(|e| CoreError::from_remote(e, Some(id)))?;

        let removable: Vec<&str> = changes
            .remove_attachments
            .iter()
            .filter(|url| {
                let linked = existing.attachments().contains(*url);
                if !linked {
                    debug!(url = %url, "skipping removal of blob not linked to the record");
                }
                linked
            })
            .map(String::as_str)
            .collect();
        self.delete_blobs(&removable).await;

        info!(id = %record.id(), "record updated");
        Ok(record)
    }

    /// Delete a record, then its attachment blobs.
    pub async fn delete(&self, id: &RecordId) -> Result<(), CoreError> {
        self.require_connectivity("delete").await?;
        let existing = self.require_existing(id).await?;

        self.remote
            .delete(id)
            .await
            .map_err(|e| CoreError::from_remote(e, Some(id)))?;

        let blobs: Vec<&str> = existing.attachments().iter().map(String::as_str).collect();
        self.delete_blobs(&blobs).await;

        info!(%id, "record deleted");
        Ok(())
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Writes are never queued: offline means fail now.
    async fn require_connectivity(&self, operation: &'static str) -> Result<(), CoreError> {
        if self.connectivity.currently_connected().await {
            Ok(())
        } else {
            warn!(operation, "rejecting write while offline");
            Err(CoreError::NoConnectivity)
        }
    }

    async fn require_existing(&self, id: &RecordId) -> Result<R, CoreError> {
        self.remote
            .get(id)
            .await
            .map_err(|e| CoreError::from_remote(e, Some(id)))?
            .ok_or_else(|| CoreError::NotFound { id: id.clone() })
    }

    /// Upload every attachment concurrently and wait for all of them.
    ///
    /// All-or-nothing: one failed upload fails the batch. Blobs that did
    /// upload are left unlinked; nothing references them.
    async fn upload_all(&self, attachments: Vec<Attachment>) -> Result<Vec<String>, CoreError> {
        if attachments.is_empty() {
            return Ok(Vec::new());
        }

        let uploads = attachments.iter().map(|attachment| {
            let name = format!("{}-{}", Uuid::new_v4(), attachment.name);
            async move {
                self.blobs
                    .upload(
                        attachment.bytes.clone(),
                        &name,
                        attachment.content_type.as_deref(),
                    )
                    .await
            }
        });
        let results = join_all(uploads).await;

        let mut urls = Vec::with_capacity(results.len());
        for (attachment, result) in attachments.iter().zip(results) {
            match result {
                Ok(url) => urls.push(url),
                Err(e) => {
                    warn!(name = %attachment.name, error = %e, "attachment upload failed");
                    let remote = CoreError::from_remote(e, None);
                    return Err(match remote {
                        CoreError::Remote { message, status } => CoreError::Remote {
                            message: format!("upload of '{}' failed: {message}", attachment.name),
                            status,
                        },
                        other => other,
                    });
                }
            }
        }

        debug!(count = urls.len(), "attachments uploaded");
        Ok(urls)
    }

    /// Best-effort, sequential. The record write already succeeded, so a
    /// failure here only orphans a blob.
    async fn delete_blobs(&self, urls: &[&str]) {
        for url in urls {
            if let Err(e) = self.blobs.delete(url).await {
                warn!(url, error = %e, "blob delete failed");
            }
        }
    }
}
