//! Clap derive structures for the `offsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// offsync -- health event records that keep working offline
#[derive(Debug, Parser)]
#[command(
    name = "offsync",
    version,
    about = "Track health events against a remote store, with an offline cache",
    long_about = "Fetch, create, update and delete health events on a remote record store.\n\n\
        Successful fetches are cached per filter. While the store is unreachable,\n\
        a cached result younger than the cache lifetime is served instead;\n\
        writes always require connectivity.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Record store profile to use
    #[arg(long, short = 'p', env = "OFFSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file (overrides the platform default location)
    #[arg(long, env = "OFFSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Record API root URL (overrides profile)
    #[arg(long, env = "OFFSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long, env = "OFFSYNC_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OFFSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Treat the store as unreachable (serve from cache only)
    #[arg(long, env = "OFFSYNC_OFFLINE", global = true)]
    pub offline: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "OFFSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "OFFSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage health events
    #[command(alias = "ev", alias = "e")]
    Events(EventsArgs),

    /// Inspect or clear the offline cache
    Cache(CacheArgs),

    /// View and change local preferences
    Prefs(PrefsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Filter Arguments ──────────────────────────────────────────

/// Query restriction shared by `events list` and `cache clear`.
#[derive(Debug, Default, Args)]
pub struct FilterArgs {
    /// Only events created on or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub from: Option<String>,

    /// Only events created on or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub to: Option<String>,

    /// Only events in this category (repeatable)
    #[arg(long = "category", short = 'c')]
    pub categories: Vec<String>,

    /// Only resolved events
    #[arg(long, conflicts_with = "unresolved")]
    pub resolved: bool,

    /// Only unresolved events
    #[arg(long)]
    pub unresolved: bool,

    /// Free-text search
    #[arg(long, short = 'Q')]
    pub query: Option<String>,
}

// ── Events ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: EventsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EventsCommand {
    /// List events matching a filter
    #[command(alias = "ls")]
    List(FilterArgs),

    /// Show one event
    Get {
        /// Event ID
        id: String,
    },

    /// Record a new event
    Create(CreateArgs),

    /// Change an existing event
    Update(UpdateArgs),

    /// Delete an event and its attachments
    #[command(alias = "rm")]
    Delete {
        /// Event ID
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Short title
    #[arg(long, short = 't')]
    pub title: String,

    /// Category (symptom, medication, appointment, measurement, injury, other)
    #[arg(long, short = 'c', default_value = "other")]
    pub category: String,

    /// Severity (low, medium, high)
    #[arg(long, short = 's', default_value = "low")]
    pub severity: String,

    /// Longer description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Mark as already resolved
    #[arg(long)]
    pub resolved: bool,

    /// Attach a file (repeatable)
    #[arg(long = "attach", short = 'a')]
    pub attachments: Vec<PathBuf>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Event ID
    pub id: String,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 's')]
    pub severity: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Mark as resolved now
    #[arg(long, conflicts_with = "reopen")]
    pub resolve: bool,

    /// Clear the resolution
    #[arg(long)]
    pub reopen: bool,

    /// Attach a file (repeatable)
    #[arg(long = "attach", short = 'a')]
    pub attachments: Vec<PathBuf>,

    /// Remove an attachment by URL (repeatable)
    #[arg(long = "detach")]
    pub detach: Vec<String>,
}

// ── Cache ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Remove the cached result for one filter, or everything with --all
    Clear {
        /// Remove every cached result for the profile
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print the cache directory for the active profile
    Path,
}

// ── Preferences ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Show stored preferences
    Show,

    /// Change stored preferences
    Set {
        /// Whether the onboarding tutorial has been completed
        #[arg(long)]
        tutorial_completed: Option<bool>,

        /// Text scale multiplier
        #[arg(long)]
        font_scale: Option<f32>,

        #[arg(long)]
        high_contrast: Option<bool>,

        #[arg(long)]
        reduce_motion: Option<bool>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with a profile
    Init {
        /// Record API root URL
        #[arg(long)]
        url: String,

        /// Profile name (defaults to --profile, then "default")
        #[arg(long)]
        name: Option<String>,
    },

    /// Display current configuration (secrets masked)
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "api_url", "cache_ttl")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's bearer token in the system keyring
    SetToken {
        /// Token value
        token: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
