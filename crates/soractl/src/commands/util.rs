//! Helpers shared across command handlers.

use std::sync::Arc;

use soractl_core::{CacheStore, Device, DeviceCatalog, Inventory, is_valid_imsi};

use crate::AppContext;
use crate::error::CliError;

/// Load the device catalog, honoring the cache policy for this invocation.
pub async fn load_catalog(ctx: &AppContext, refresh: bool) -> Result<DeviceCatalog, CliError> {
    let inventory = Inventory::new(&ctx.api, CacheStore::in_cache_dir());
    inventory
        .load(ctx.use_cache, refresh)
        .await
        .map_err(|e| ctx.map_core(e))
}

/// Resolve a single device from a query string.
///
/// A 15-digit query is treated as an IMSI and looked up directly; anything
/// else goes through the catalog search (exact name matches win). Exactly
/// one hit is required.
pub fn resolve_device(catalog: &DeviceCatalog, query: &str) -> Result<Arc<Device>, CliError> {
    if is_valid_imsi(query) {
        return catalog
            .find_by_identity(query)
            .ok_or_else(|| CliError::DeviceNotFound {
                query: query.to_owned(),
            });
    }

    let mut matches = catalog.search(query);
    match matches.len() {
        0 => Err(CliError::DeviceNotFound {
            query: query.to_owned(),
        }),
        1 => Ok(matches.remove(0)),
        n => Err(CliError::AmbiguousDevice {
            query: query.to_owned(),
            count: n,
            matches: matches
                .iter()
                .take(5)
                .map(|d| d.display_name().to_owned())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Resolve the device and its identity in one step.
pub fn resolve_identified(
    catalog: &DeviceCatalog,
    query: &str,
) -> Result<(Arc<Device>, String), CliError> {
    let device = resolve_device(catalog, query)?;
    let imsi = device
        .identity()
        .ok_or_else(|| CliError::MissingIdentity {
            device: device.display_name().to_owned(),
        })?
        .to_owned();
    Ok((device, imsi))
}

/// Format an optional timestamp for display.
pub fn format_timestamp(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map_or_else(
        || "-".into(),
        |dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}
