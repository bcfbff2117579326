//! Inventory cache handlers. These never touch the API.

use soractl_core::CacheStore;

use crate::cli::{CacheArgs, CacheCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: CacheArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let store = CacheStore::in_cache_dir();
    match args.command {
        CacheCommand::Clear => {
            store.clear().map_err(|e| CliError::Validation {
                field: "cache".into(),
                reason: e.to_string(),
            })?;
            output::print_output("Inventory cache cleared.", global.quiet);
            Ok(())
        }
        CacheCommand::Path => {
            output::print_output(&store.path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}
