//! Command dispatch: bridges CLI args -> core Controller -> output formatting.

pub mod cache;
pub mod config_cmd;
pub mod events;
pub mod prefs;
pub mod util;

use std::sync::Arc;

use offsync_core::{
    ConnectivityMonitor, Controller, FileKvStore, HealthEvent, KeyValueStore, StaticConnectivity,
};

use crate::cli::GlobalOpts;
use crate::config::{self, StoreContext};
use crate::error::CliError;

/// The persisted store backing a profile's cache and preferences.
pub fn open_store(ctx: &StoreContext) -> Arc<dyn KeyValueStore> {
    Arc::new(FileKvStore::new(ctx.cache_dir.clone()))
}

/// Wire a controller for the active profile. `--offline` replaces the
/// reachability probe with a fixed answer.
pub fn connect(global: &GlobalOpts) -> Result<Controller<HealthEvent>, CliError> {
    let session = config::resolve_session(global)?;
    tracing::debug!(
        profile = %session.store.profile_name,
        api = %session.remote.api_url,
        cache_dir = %session.store.cache_dir.display(),
        "connecting"
    );

    let connectivity: Option<Arc<dyn ConnectivityMonitor>> = if global.offline {
        Some(Arc::new(StaticConnectivity::offline()))
    } else {
        None
    };

    Ok(Controller::with_http(
        &session.remote,
        &session.store.sync,
        open_store(&session.store),
        connectivity,
    )?)
}
