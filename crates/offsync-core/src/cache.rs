// ── Time-bounded snapshot cache ──
//
// One envelope per filter signature, persisted through a `KeyValueStore`.
// Every failure in here is logged and swallowed: a cache problem must
// never fail an operation whose remote half already succeeded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::model::FilterSpec;
use crate::persist::KvError;
use crate::source::KeyValueStore;

/// Local persistence failure. Only ever logged.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage failed: {0}")]
    Store(#[from] KvError),

    #[error("cache entry could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

/// A timestamped snapshot of one query's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<R> {
    pub data: Vec<R>,
    /// When the remote fetch that produced `data` completed.
    pub stored_at: DateTime<Utc>,
}

impl<R> CacheEnvelope<R> {
    /// Age at `now`. Never negative, even if the clock stepped back.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        (now - self.stored_at).max(chrono::Duration::zero())
    }
}

/// Persisted, TTL-aware snapshot cache keyed by filter signature.
pub struct CacheStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    prefix: String,
}

impl CacheStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &SyncConfig) -> Self {
        Self::with_clock(kv, config, Arc::new(SystemClock))
    }

    pub fn with_clock(kv: Arc<dyn KeyValueStore>, config: &SyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            clock,
            ttl: to_chrono(config.cache_ttl),
            prefix: config.cache_prefix.clone(),
        }
    }

    /// Cache key for a filter: `{prefix}:{signature}`.
    pub fn key_for(&self, filter: &FilterSpec) -> String {
        format!("{}:{}", self.prefix, filter.signature())
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// An envelope is fresh iff `now - stored_at < ttl`.
    pub fn is_fresh<R>(&self, envelope: &CacheEnvelope<R>) -> bool {
        envelope.age(self.clock.now()) < self.ttl
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Look up the envelope for `key`. Unreadable entries count as absent.
    pub async fn get<R: DeserializeOwned>(&self, key: &str) -> Option<CacheEnvelope<R>> {
        match self.try_get(key).await {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn try_get<R: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CacheEnvelope<R>>, CacheError> {
        let Some(bytes) = self.kv.read(key).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Store `data` stamped with the current instant, replacing any
    /// previous envelope for `key`.
    pub async fn put<R: Serialize>(&self, key: &str, data: &[R]) {
        let stored_at = self.clock.now();
        match self.try_put(key, data, stored_at).await {
            Ok(()) => debug!(key, count = data.len(), %stored_at, "cache updated"),
            Err(e) => warn!(key, error = %e, "cache write failed"),
        }
    }

    async fn try_put<R: Serialize>(
        &self,
        key: &str,
        data: &[R],
        stored_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct EnvelopeRef<'a, R> {
            data: &'a [R],
            stored_at: DateTime<Utc>,
        }

        let bytes = serde_json::to_vec(&EnvelopeRef { data, stored_at })?;
        self.kv.write(key, &bytes).await?;
        Ok(())
    }

    /// Remove the envelope for one filter. Idempotent.
    pub async fn clear(&self, filter: &FilterSpec) {
        let key = self.key_for(filter);
        match self.kv.remove(&key).await {
            Ok(()) => debug!(key, "cache entry cleared"),
            Err(e) => warn!(key, error = %e, "cache clear failed"),
        }
    }

    /// Remove every envelope under this cache's prefix. Other keys in the
    /// shared store (preferences) are left alone.
    pub async fn clear_all(&self) {
        let keys = match self.kv.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "cache key listing failed");
                return;
            }
        };

        let marker = format!("{}:", self.prefix);
        let mut cleared = 0usize;
        for key in keys.iter().filter(|k| k.starts_with(&marker)) {
            match self.kv.remove(key).await {
                Ok(()) => cleared += 1,
                Err(e) => warn!(key, error = %e, "cache clear failed"),
            }
        }
        debug!(cleared, "cache cleared");
    }
}

fn to_chrono(ttl: Duration) -> chrono::Duration {
    chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX)
}
