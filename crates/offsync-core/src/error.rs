// ── Core error types ──
//
// User-facing errors from offsync-core. Consumers never see HTTP status
// codes or JSON parse failures directly: collaborators report a
// `RemoteError`, and the coordinator folds that into `CoreError`.
// Cache persistence failures are deliberately absent here; they are
// logged inside the cache module and never reach a caller.

use thiserror::Error;

use crate::model::RecordId;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connectivity ─────────────────────────────────────────────────
    /// Disconnected with no usable cache, or a write attempted offline.
    #[error("No network connection and no usable cached data")]
    NoConnectivity,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Record not found: {id}")]
    NotFound { id: RecordId },

    // ── Remote errors (wrapped, not exposed raw) ─────────────────────
    #[error("Remote store error: {message}")]
    Remote {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Whether a caller-initiated retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NoConnectivity => true,
            Self::Remote { status, .. } => status.is_none_or(|s| s == 429 || s >= 500),
            _ => false,
        }
    }

    /// Translate a collaborator failure. `id` is the record the operation
    /// targeted, if any; a not-found without one is an ordinary remote error.
    pub(crate) fn from_remote(err: RemoteError, id: Option<&RecordId>) -> Self {
        match (err, id) {
            (RemoteError::NotFound, Some(id)) => Self::NotFound { id: id.clone() },
            (RemoteError::NotFound, None) => Self::Remote {
                message: "resource not found".into(),
                status: Some(404),
            },
            (RemoteError::Failed { message, status }, _) => Self::Remote { message, status },
        }
    }
}

// ── Collaborator errors ──────────────────────────────────────────────

/// Error reported by a remote data source or blob store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("not found")]
    NotFound,

    #[error("{message}")]
    Failed {
        message: String,
        status: Option<u16>,
    },
}

impl RemoteError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            status: None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<offsync_api::Error> for RemoteError {
    fn from(err: offsync_api::Error) -> Self {
        if err.is_not_found() {
            return Self::NotFound;
        }
        Self::Failed {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<offsync_api::Error> for CoreError {
    fn from(err: offsync_api::Error) -> Self {
        match err {
            offsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            offsync_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("URL cannot be used as an API base: {url}"),
            },
            offsync_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            other => CoreError::from_remote(RemoteError::from(other), None),
        }
    }
}
