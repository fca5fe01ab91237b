// ── Controller facade ──
//
// Pairs one SyncCoordinator with one ViewStore and applies the matching
// view transition for every coordinator outcome. This is the only writer
// of the view store; presentation layers observe it.

use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheStore;
use crate::config::{RemoteConfig, SyncConfig};
use crate::coordinator::SyncCoordinator;
use crate::error::CoreError;
use crate::http::HttpCollaborators;
use crate::model::{FilterPatch, FilterSpec, NewRecord, RecordChanges, RecordId, SyncRecord};
use crate::source::{ConnectivityMonitor, KeyValueStore};
use crate::store::{ViewState, ViewStore};
use crate::stream::ViewStream;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Constructed by the
/// application's composition root, which owns the lifecycle of the
/// cache and view stores it was built from.
pub struct Controller<R: SyncRecord> {
    inner: Arc<ControllerInner<R>>,
}

impl<R: SyncRecord> Clone for Controller<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<R: SyncRecord> {
    coordinator: SyncCoordinator<R>,
    view: Arc<ViewStore<R>>,
}

impl<R: SyncRecord> Controller<R> {
    pub fn new(coordinator: SyncCoordinator<R>, view: Arc<ViewStore<R>>) -> Self {
        Self {
            inner: Arc::new(ControllerInner { coordinator, view }),
        }
    }

    /// Wire HTTP collaborators and a persisted store into a controller.
    ///
    /// `connectivity` overrides the HTTP reachability probe (e.g. a
    /// forced-offline flag); `None` probes `remote.probe_url`.
    pub fn with_http(
        remote: &RemoteConfig,
        sync: &SyncConfig,
        kv: Arc<dyn KeyValueStore>,
        connectivity: Option<Arc<dyn ConnectivityMonitor>>,
    ) -> Result<Self, CoreError> {
        let http = HttpCollaborators::<R>::connect(remote)?;
        let connectivity: Arc<dyn ConnectivityMonitor> = match connectivity {
            Some(monitor) => monitor,
            None => Arc::new(http.probe),
        };
        let cache = Arc::new(CacheStore::new(kv, sync));

        let coordinator = SyncCoordinator::new(
            connectivity,
            Arc::new(http.records),
            Arc::new(http.blobs),
            cache,
        );
        Ok(Self::new(coordinator, Arc::new(ViewStore::new())))
    }

    pub fn coordinator(&self) -> &SyncCoordinator<R> {
        &self.inner.coordinator
    }

    pub fn view(&self) -> &Arc<ViewStore<R>> {
        &self.inner.view
    }

    // ── State observation ────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<ViewState<R>> {
        self.inner.view.snapshot()
    }

    pub fn subscribe(&self) -> ViewStream<R> {
        self.inner.view.subscribe()
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Re-fetch using the view's active filters.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let filter = self.inner.view.snapshot().filters.clone();
        self.fetch_with(&filter).await
    }

    /// Merge `patch` into the active filters, then re-fetch.
    pub async fn apply_filters(&self, patch: FilterPatch) -> Result<(), CoreError> {
        self.inner.view.set_filters(patch);
        self.refresh().await
    }

    async fn fetch_with(&self, filter: &FilterSpec) -> Result<(), CoreError> {
        let view = &self.inner.view;
        view.begin_fetch();

        match self.inner.coordinator.fetch_list(filter).await {
            Ok(outcome) => {
                view.fetch_succeeded(outcome.records, outcome.is_offline);
                Ok(())
            }
            Err(err) => {
                if matches!(err, CoreError::NoConnectivity) {
                    view.set_offline(true);
                }
                view.fetch_failed(err.to_string());
                Err(err)
            }
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create a record and, once the remote confirms, prepend it.
    pub async fn create_record(&self, input: NewRecord<R::Fields>) -> Result<R, CoreError> {
        let result = self.inner.coordinator.create(input).await;
        self.settle(result, |view, record| view.record_created(record.clone()))
    }

    pub async fn update_record(
        &self,
        id: &RecordId,
        changes: RecordChanges<R::Fields>,
    ) -> Result<R, CoreError> {
        let result = self.inner.coordinator.update(id, changes).await;
        self.settle(result, |view, record| view.record_updated(record.clone()))
    }

    pub async fn delete_record(&self, id: &RecordId) -> Result<(), CoreError> {
        let result = self.inner.coordinator.delete(id).await;
        self.settle(result, |view, _| view.record_deleted(id))
    }

    /// Apply `on_success` or report the failure on the view.
    fn settle<T>(
        &self,
        result: Result<T, CoreError>,
        on_success: impl FnOnce(&ViewStore<R>, &T),
    ) -> Result<T, CoreError> {
        match result {
            Ok(value) => {
                on_success(&self.inner.view, &value);
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "mutation failed");
                self.inner.view.mutation_failed(err.to_string());
                Err(err)
            }
        }
    }

    // ── Cache invalidation ───────────────────────────────────────────

    pub async fn clear_cache(&self, filter: &FilterSpec) {
        self.inner.coordinator.cache().clear(filter).await;
    }

    /// Drop every cached snapshot (e.g. on logout).
    pub async fn clear_all_cache(&self) {
        self.inner.coordinator.cache().clear_all().await;
    }
}
