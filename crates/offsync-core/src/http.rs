// ── HTTP collaborators ──
//
// Adapters from the offsync-api clients onto the collaborator traits in
// `source`. Endpoint layout and auth come from `RemoteConfig`.

use std::marker::PhantomData;

use async_trait::async_trait;
use bytes::Bytes;
use offsync_api::{
    BlobClient, HttpProbe, RecordClient, RecordQuery, TlsMode, TransportConfig,
};

use crate::config::{RemoteConfig, TlsVerification};
use crate::error::{CoreError, RemoteError};
use crate::model::{FilterSpec, RecordDraft, RecordId, SyncRecord};
use crate::source::{BlobStore, ConnectivityMonitor, RemoteDataSource};

/// The three HTTP collaborators built from one `RemoteConfig`.
pub struct HttpCollaborators<R> {
    pub records: HttpRemote<R>,
    pub blobs: HttpBlobStore,
    pub probe: ProbeMonitor,
}

impl<R: SyncRecord> HttpCollaborators<R> {
    pub fn connect(config: &RemoteConfig) -> Result<Self, CoreError> {
        let transport = transport_config(config);

        Ok(Self {
            records: HttpRemote::new(RecordClient::new(config.api_url.clone(), &transport)?),
            blobs: HttpBlobStore::new(BlobClient::new(config.blob_url.clone(), &transport)?),
            probe: ProbeMonitor::new(HttpProbe::new(
                config.probe_url.clone(),
                &transport,
                config.probe_timeout,
            )?),
        })
    }
}

/// Map the sync layer's remote settings onto the transport builder.
pub fn transport_config(config: &RemoteConfig) -> TransportConfig {
    let tls = match &config.tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    };

    TransportConfig {
        tls,
        timeout: config.timeout,
        token: config.token.clone(),
    }
}

/// Flatten a filter into wire query parameters.
pub fn record_query(filter: &FilterSpec) -> RecordQuery {
    RecordQuery {
        from: filter.date_range.from,
        to: filter.date_range.to,
        categories: filter.categories.iter().cloned().collect(),
        resolved: filter.resolved,
        text: filter.query.clone(),
    }
}

// ── Records ──────────────────────────────────────────────────────────

/// `RemoteDataSource` over the REST record API.
pub struct HttpRemote<R> {
    client: RecordClient,
    _record: PhantomData<fn() -> R>,
}

impl<R> HttpRemote<R> {
    pub fn new(client: RecordClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: SyncRecord> RemoteDataSource<R> for HttpRemote<R> {
    async fn list(&self, filter: &FilterSpec) -> Result<Vec<R>, RemoteError> {
        Ok(self.client.list(&record_query(filter)).await?)
    }

    async fn get(&self, id: &RecordId) -> Result<Option<R>, RemoteError> {
        Ok(self.client.get(id.as_str()).await?)
    }

    async fn create(&self, draft: RecordDraft<R::Fields>) -> Result<R, RemoteError> {
        Ok(self.client.create(&draft).await?)
    }

    async fn update(
        &self,
        id: &RecordId,
        draft: RecordDraft<R::Fields>,
    ) -> Result<R, RemoteError> {
        Ok(self.client.update(id.as_str(), &draft).await?)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RemoteError> {
        Ok(self.client.delete(id.as_str()).await?)
    }
}

// ── Blobs ────────────────────────────────────────────────────────────

pub struct HttpBlobStore {
    client: BlobClient,
}

impl HttpBlobStore {
    pub fn new(client: BlobClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(
        &self,
        bytes: Bytes,
        name: &str,
        content_type: Option<&str>,
    ) -> Result<String, RemoteError> {
        Ok(self.client.upload(bytes, name, content_type).await?)
    }

    async fn delete(&self, url: &str) -> Result<(), RemoteError> {
        Ok(self.client.delete(url).await?)
    }
}

// ── Connectivity ─────────────────────────────────────────────────────

/// Connectivity decided by a `HEAD` against the health endpoint, once
/// per call.
pub struct ProbeMonitor {
    probe: HttpProbe,
}

impl ProbeMonitor {
    pub fn new(probe: HttpProbe) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ConnectivityMonitor for ProbeMonitor {
    async fn currently_connected(&self) -> bool {
        self.probe.reachable().await
    }
}
