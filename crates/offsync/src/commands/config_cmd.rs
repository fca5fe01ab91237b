//! Config subcommand handlers.

use std::fmt::Write;

use offsync_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    cfg
}

/// Format config for display. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "probe_timeout = {}", cfg.defaults.probe_timeout);
    let _ = writeln!(out, "cache_ttl = {}", cfg.defaults.cache_ttl);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref url) = p.blob_url {
            let _ = writeln!(out, "blob_url = \"{url}\"");
        }
        if let Some(ref url) = p.probe_url {
            let _ = writeln!(out, "probe_url = \"{url}\"");
        }
        if let Some(ref token) = p.token {
            let _ = writeln!(out, "token = \"{token}\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ttl) = p.cache_ttl {
            let _ = writeln!(out, "cache_ttl = {ttl}");
        }
        if let Some(ref dir) = p.cache_dir {
            let _ = writeln!(out, "cache_dir = \"{}\"", dir.display());
        }
    }

    out
}

fn validate_url(field: &str, raw: &str) -> Result<(), CliError> {
    raw.parse::<url::Url>()
        .map(|_| ())
        .map_err(|e| CliError::Validation {
            field: field.into(),
            reason: format!("invalid URL '{raw}': {e}"),
        })
}

fn parse_number(field: &str, raw: &str) -> Result<u64, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a number (seconds)".into(),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init { url, name } => {
            validate_url("url", &url)?;
            let mut cfg = config::load_config(global)?;
            let profile_name = name
                .or_else(|| global.profile.clone())
                .unwrap_or_else(|| "default".into());

            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    api_url: url,
                    ..Profile::default()
                },
            );
            if cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }
            config::save_config(global, &cfg)?;

            if !global.quiet {
                let path = config::config_path(global);
                eprintln!("✓ Profile '{profile_name}' written to {}", path.display());
                eprintln!("  Test it: offsync events list --profile {profile_name}");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config(global)?);
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                "config".into()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config(global)?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "api_url" | "api-url" => {
                    validate_url("api_url", &value)?;
                    profile.api_url = value;
                }
                "blob_url" | "blob-url" => {
                    validate_url("blob_url", &value)?;
                    profile.blob_url = Some(value);
                }
                "probe_url" | "probe-url" => {
                    validate_url("probe_url", &value)?;
                    profile.probe_url = Some(value);
                }
                "token" => profile.token = Some(value),
                "token_env" | "token-env" => profile.token_env = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "cache_dir" | "cache-dir" => profile.cache_dir = Some(value.into()),
                "insecure" => {
                    profile.insecure = Some(value.parse().map_err(|_| CliError::Validation {
                        field: "insecure".into(),
                        reason: "must be 'true' or 'false'".into(),
                    })?);
                }
                "timeout" => profile.timeout = Some(parse_number("timeout", &value)?),
                "cache_ttl" | "cache-ttl" => {
                    profile.cache_ttl = Some(parse_number("cache_ttl", &value)?);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: api_url, blob_url, \
                             probe_url, token, token_env, ca_cert, cache_dir, insecure, \
                             timeout, cache_ttl"
                        ),
                    });
                }
            }

            config::save_config(global, &cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config(global)?;
            let active = config::active_profile_name(global, &cfg);
            let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
            names.sort();

            let out = names
                .iter()
                .map(|name| {
                    if *name == active {
                        format!("* {name}")
                    } else {
                        format!("  {name}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config(global)?;
            offsync_config::find_profile(&cfg, &name)?;
            cfg.default_profile = Some(name.clone());
            config::save_config(global, &cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        // ── SetToken <token> ────────────────────────────────────────
        ConfigCommand::SetToken { token } => {
            let cfg = config::load_config(global)?;
            let profile_name = config::active_profile_name(global, &cfg);
            offsync_config::store_token(&profile_name, &token)?;
            if !global.quiet {
                eprintln!("✓ Token for profile '{profile_name}' stored in system keyring");
            }
            Ok(())
        }
    }
}
