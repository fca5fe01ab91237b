// ── Runtime sync configuration ──
//
// These types describe *how* the sync layer behaves and where its HTTP
// collaborators live. They carry credential data and tuning, but never
// touch disk. The CLI constructs them (via offsync-config) and hands
// them in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default cache time-to-live.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default prefix for cache keys in the persisted key-value store.
pub const DEFAULT_CACHE_PREFIX: &str = "records_cache";

/// Cache behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// How long a cached snapshot may be served while offline.
    pub cache_ttl: Duration,
    /// Prefix shared by every cache key; `clear_all` only touches these.
    pub cache_prefix: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_prefix: DEFAULT_CACHE_PREFIX.into(),
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development servers).
    DangerAcceptInvalid,
}

/// Where the HTTP collaborators live and how to reach them.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Record API root; `records` is appended.
    pub api_url: Url,
    /// Blob API root; `blobs` is appended.
    pub blob_url: Url,
    /// Endpoint probed with `HEAD` to decide connectivity.
    pub probe_url: Url,
    /// Bearer token, if the store requires one.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    /// Request timeout for record and blob calls.
    pub timeout: Duration,
    /// Timeout for the reachability probe.
    pub probe_timeout: Duration,
}

impl RemoteConfig {
    /// Endpoints derived from a single API root: blobs on the same
    /// root, probe at `{api_url}/health`.
    pub fn from_api_url(api_url: Url) -> Result<Self, url::ParseError> {
        let base = if api_url.path().ends_with('/') {
            api_url.clone()
        } else {
            Url::parse(&format!("{api_url}/"))?
        };
        let probe_url = base.join("health")?;

        Ok(Self {
            blob_url: api_url.clone(),
            api_url,
            probe_url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            probe_timeout: offsync_api::probe::DEFAULT_PROBE_TIMEOUT,
        })
    }
}
