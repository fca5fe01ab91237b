//! Offline cache command handlers. These work without a reachable store.

use offsync_core::CacheStore;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{open_store, util};

pub async fn handle(args: CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = config::resolve_store(global)?;

    match args.command {
        CacheCommand::Clear { all, filter } => {
            let cache = CacheStore::new(open_store(&ctx), &ctx.sync);
            if all {
                cache.clear_all().await;
                if !global.quiet {
                    eprintln!("✓ Cleared all cached results for profile '{}'", ctx.profile_name);
                }
            } else {
                let spec = util::filter_spec(&filter)?;
                cache.clear(&spec).await;
                if !global.quiet {
                    eprintln!("✓ Cleared cached result for {}", cache.key_for(&spec));
                }
            }
            Ok(())
        }

        CacheCommand::Path => {
            output::print_output(&ctx.cache_dir.display().to_string(), global.quiet);
            Ok(())
        }
    }
}
