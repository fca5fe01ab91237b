//! CLI-side configuration: applies `GlobalOpts` overrides on top of the
//! shared `offsync-config` profiles.
//!
//! Core never sees these types -- it receives pre-built `RemoteConfig` and
//! `SyncConfig` values.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use offsync_config::{Config, Profile};
use offsync_core::{RemoteConfig, SyncConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything needed to open the local store for a profile.
#[derive(Debug)]
pub struct StoreContext {
    pub profile_name: String,
    pub cache_dir: PathBuf,
    pub sync: SyncConfig,
}

/// A fully resolved profile, ready to wire a `Controller`.
#[derive(Debug)]
pub struct Session {
    pub store: StoreContext,
    pub remote: RemoteConfig,
}

// ── Config file ──────────────────────────────────────────────────────

/// Config file path: `--config` flag > platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(offsync_config::config_path)
}

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(offsync_config::load_config_from(&config_path(global))?)
}

pub fn save_config(global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    Ok(offsync_config::save_config_to(cfg, &config_path(global))?)
}

pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    offsync_config::active_profile_name(global.profile.as_deref(), cfg)
}

// ── Profile resolution ───────────────────────────────────────────────

/// The active profile with `--api-url` applied. Without a configured
/// profile, `--api-url` alone is enough.
fn effective_profile(global: &GlobalOpts, cfg: &Config, name: &str) -> Result<Profile, CliError> {
    let mut profile = match cfg.profiles.get(name) {
        Some(profile) => profile.clone(),
        None if global.api_url.is_some() => Profile::default(),
        None if cfg.profiles.is_empty() => {
            return Err(CliError::NoConfig {
                path: config_path(global).display().to_string(),
            });
        }
        None => offsync_config::find_profile(cfg, name)?.clone(),
    };

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    Ok(profile)
}

/// Resolve the local store for the active profile. Needs no remote
/// settings, so it works for `cache` and `prefs` without a profile.
pub fn resolve_store(global: &GlobalOpts) -> Result<StoreContext, CliError> {
    let cfg = load_config(global)?;
    let profile_name = active_profile_name(global, &cfg);
    let profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();

    Ok(StoreContext {
        cache_dir: offsync_config::profile_cache_dir(&profile, &profile_name),
        sync: offsync_config::profile_to_sync_config(&profile, &cfg.defaults),
        profile_name,
    })
}

/// Translate config + global flags into core configs.
///
/// This is the single boundary where CLI config types cross into core types.
pub fn resolve_session(global: &GlobalOpts) -> Result<Session, CliError> {
    let cfg = load_config(global)?;
    let profile_name = active_profile_name(global, &cfg);
    let profile = effective_profile(global, &cfg, &profile_name)?;

    // Token: flag > env (via clap) > profile chain
    let token = global
        .token
        .clone()
        .map(SecretString::from)
        .or_else(|| offsync_config::resolve_token(&profile, &profile_name));

    let mut remote = offsync_config::profile_to_remote_config(&profile, &cfg.defaults, token)?;
    if global.insecure {
        remote.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        remote.timeout = Duration::from_secs(secs);
    }

    Ok(Session {
        store: StoreContext {
            cache_dir: offsync_config::profile_cache_dir(&profile, &profile_name),
            sync: offsync_config::profile_to_sync_config(&profile, &cfg.defaults),
            profile_name,
        },
        remote,
    })
}
