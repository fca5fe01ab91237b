//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use offsync_config::ConfigError;
use offsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connectivity ─────────────────────────────────────────────────

    #[error("The record store is unreachable and no fresh cached result exists")]
    #[diagnostic(
        code(offsync::offline),
        help(
            "Cached results are only served while younger than the cache lifetime.\n\
             Writes always need a connection. Retry once the store is reachable."
        )
    )]
    Offline,

    // ── Authentication ───────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(offsync::auth_failed),
        help(
            "Verify the bearer token for this profile.\n\
             Run: offsync config set-token <TOKEN>  or set OFFSYNC_TOKEN."
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(offsync::not_found),
        help("Run: offsync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Remote store ─────────────────────────────────────────────────

    #[error("Record store error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(offsync::remote_error))]
    Remote { message: String, status: Option<u16> },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(offsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(offsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: offsync config init --url <URL> --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No record store configured")]
    #[diagnostic(
        code(offsync::no_config),
        help(
            "Create a profile with: offsync config init --url <URL>\n\
             Or pass --api-url / set OFFSYNC_API_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(offsync::config))]
    Config(ConfigError),

    #[error("Internal error: {0}")]
    #[diagnostic(code(offsync::internal))]
    Internal(String),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    #[diagnostic(code(offsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Offline => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NoConnectivity => CliError::Offline,

            CoreError::NotFound { id } => CliError::NotFound {
                resource_type: "event".into(),
                identifier: id.to_string(),
                list_command: "events list".into(),
            },

            CoreError::Remote {
                message,
                status: Some(401 | 403),
            } => CliError::AuthFailed { message },

            CoreError::Remote { message, status } => CliError::Remote { message, status },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
