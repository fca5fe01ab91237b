//! Shared configuration for offsync tools.
//!
//! TOML profiles, platform paths, bearer-token resolution (env + keyring +
//! plaintext), and translation to `offsync_core::{RemoteConfig, SyncConfig}`.
//! Core never reads files; it receives the pre-built configs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use offsync_core::{RemoteConfig, SyncConfig, TlsVerification};

const KEYRING_SERVICE: &str = "offsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named record-store profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Reachability probe timeout, seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Offline cache lifetime, seconds.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
            probe_timeout: default_probe_timeout(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_probe_timeout() -> u64 {
    3
}
fn default_cache_ttl() -> u64 {
    offsync_core::config::DEFAULT_CACHE_TTL.as_secs()
}

/// A named record-store profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Record API root (e.g., "https://sync.example.com/v1").
    pub api_url: String,

    /// Blob API root. Defaults to `api_url`.
    pub blob_url: Option<String>,

    /// Health endpoint probed for connectivity. Defaults to `{api_url}/health`.
    pub probe_url: Option<String>,

    /// Bearer token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the bearer token.
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override request timeout.
    pub timeout: Option<u64>,

    /// Override cache lifetime.
    pub cache_ttl: Option<u64>,

    /// Override the on-disk cache directory.
    pub cache_dir: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "offsync", "offsync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Root directory for persisted cache stores, one subdirectory per profile.
pub fn cache_root() -> PathBuf {
    project_dirs().map_or_else(
        || home_fallback(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

/// The cache directory for one profile, honoring its override.
pub fn profile_cache_dir(profile: &Profile, profile_name: &str) -> PathBuf {
    profile
        .cache_dir
        .clone()
        .unwrap_or_else(|| cache_root().join(profile_name))
}

fn home_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("offsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// `OFFSYNC_`-prefixed variables override file values; nested keys use a
/// double underscore (`OFFSYNC_DEFAULTS__TIMEOUT=5`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OFFSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile lookup ──────────────────────────────────────────────────

/// Active profile name: explicit choice > config default > "default".
pub fn active_profile_name(requested: Option<&str>, config: &Config) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn find_profile<'a>(config: &'a Config, name: &str) -> Result<&'a Profile, ConfigError> {
    config.profiles.get(name).ok_or_else(|| {
        let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        ConfigError::ProfileNotFound {
            name: name.into(),
            available: if names.is_empty() {
                "(none)".into()
            } else {
                names.join(", ")
            },
        }
    })
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the bearer token from the credential chain.
///
/// Tokens are optional: a store without auth simply has none configured.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Store a profile's bearer token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(token)?;
    Ok(())
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/token")
}

// ── Translation to core configs ─────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Build a `RemoteConfig` from a profile. `token` comes from
/// [`resolve_token`] or a CLI override.
pub fn profile_to_remote_config(
    profile: &Profile,
    defaults: &Defaults,
    token: Option<SecretString>,
) -> Result<RemoteConfig, ConfigError> {
    let api_url = parse_url("api_url", &profile.api_url)?;
    let mut remote =
        RemoteConfig::from_api_url(api_url).map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: e.to_string(),
        })?;

    if let Some(ref raw) = profile.blob_url {
        remote.blob_url = parse_url("blob_url", raw)?;
    }
    if let Some(ref raw) = profile.probe_url {
        remote.probe_url = parse_url("probe_url", raw)?;
    }

    remote.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    remote.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    remote.probe_timeout = Duration::from_secs(defaults.probe_timeout);
    remote.token = token;
    Ok(remote)
}

pub fn profile_to_sync_config(profile: &Profile, defaults: &Defaults) -> SyncConfig {
    SyncConfig {
        cache_ttl: Duration::from_secs(profile.cache_ttl.unwrap_or(defaults.cache_ttl)),
        ..SyncConfig::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn profile(api_url: &str) -> Profile {
        Profile {
            api_url: api_url.into(),
            ..Profile::default()
        }
    }

    #[test]
    fn file_values_and_env_overrides_merge() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                default_profile = "home"

                [defaults]
                cache_ttl = 120

                [profiles.home]
                api_url = "https://sync.example.com/v1"
                token_env = "HOME_SYNC_TOKEN"
                "#,
            )?;
            jail.set_env("OFFSYNC_DEFAULTS__TIMEOUT", "5");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.default_profile.as_deref(), Some("home"));
            assert_eq!(cfg.defaults.cache_ttl, 120);
            assert_eq!(cfg.defaults.timeout, 5);
            assert_eq!(cfg.defaults.output, "table");
            assert_eq!(
                cfg.profiles["home"].token_env.as_deref(),
                Some("HOME_SYNC_TOKEN")
            );
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert!(cfg.profiles.is_empty());
            assert_eq!(cfg.defaults.cache_ttl, 300);
            Ok(())
        });
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles
            .insert("work".into(), profile("https://records.work.test"));
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["work"], profile("https://records.work.test"));
    }

    #[test]
    fn unknown_profile_lists_available_names() {
        let mut cfg = Config::default();
        cfg.profiles.insert("b".into(), profile("https://b.test"));
        cfg.profiles.insert("a".into(), profile("https://a.test"));

        let err = find_profile(&cfg, "c").unwrap_err();
        assert_eq!(
            err.to_string(),
            "profile 'c' not found (available: a, b)"
        );
    }

    #[test]
    fn active_profile_prefers_explicit_choice() {
        let cfg = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        assert_eq!(active_profile_name(Some("work"), &cfg), "work");
        assert_eq!(active_profile_name(None, &cfg), "home");
    }

    #[test]
    fn remote_config_derives_endpoints_and_tls() {
        let mut p = profile("https://sync.example.com/v1");
        p.blob_url = Some("https://files.example.com".into());
        p.ca_cert = Some(PathBuf::from("/etc/ssl/sync-ca.pem"));
        p.timeout = Some(10);

        let remote = profile_to_remote_config(
            &p,
            &Defaults::default(),
            Some(SecretString::from("t0ken".to_owned())),
        )
        .unwrap();

        assert_eq!(remote.api_url.as_str(), "https://sync.example.com/v1");
        assert_eq!(remote.blob_url.as_str(), "https://files.example.com/");
        assert_eq!(remote.probe_url.as_str(), "https://sync.example.com/v1/health");
        assert_eq!(
            remote.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/sync-ca.pem"))
        );
        assert_eq!(remote.timeout, Duration::from_secs(10));
        assert_eq!(remote.probe_timeout, Duration::from_secs(3));
        assert_eq!(remote.token.unwrap().expose_secret(), "t0ken");
    }

    #[test]
    fn insecure_wins_over_custom_ca() {
        let mut p = profile("https://sync.example.com");
        p.ca_cert = Some(PathBuf::from("ca.pem"));
        p.insecure = Some(true);

        let remote = profile_to_remote_config(&p, &Defaults::default(), None).unwrap();
        assert_eq!(remote.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn invalid_api_url_is_a_validation_error() {
        let err = profile_to_remote_config(&profile("not a url"), &Defaults::default(), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api_url"));
    }

    #[test]
    fn token_falls_back_to_plaintext() {
        let mut p = profile("https://sync.example.com");
        p.token = Some("plain".into());
        p.token_env = Some("OFFSYNC_TEST_TOKEN_THAT_IS_NEVER_SET".into());

        let token = resolve_token(&p, "offsync-test-profile-without-keyring-entry").unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    fn sync_config_uses_profile_ttl_override() {
        let mut p = profile("https://sync.example.com");
        assert_eq!(
            profile_to_sync_config(&p, &Defaults::default()).cache_ttl,
            Duration::from_secs(300)
        );
        p.cache_ttl = Some(60);
        let sync = profile_to_sync_config(&p, &Defaults::default());
        assert_eq!(sync.cache_ttl, Duration::from_secs(60));
        assert_eq!(sync.cache_prefix, "records_cache");
    }
}
