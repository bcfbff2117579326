//! Inventory loading and the categorized device catalog.

use std::sync::Arc;

use soractl_api::{ApiClient, DeviceRecord, FetchOptions, SubscriberFilters};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::CoreError;
use crate::model::Device;

/// Devices categorized by connectivity, in fetch order.
#[derive(Debug, Default, Clone)]
pub struct DeviceCatalog {
    all: Vec<Arc<Device>>,
    online: Vec<Arc<Device>>,
    offline: Vec<Arc<Device>>,
}

/// Summary counts for the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

impl DeviceCatalog {
    /// Build a catalog from raw records, categorizing in a single pass.
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            let device = Arc::new(Device::new(record));
            if device.is_online() {
                catalog.online.push(Arc::clone(&device));
            } else {
                catalog.offline.push(Arc::clone(&device));
            }
            catalog.all.push(device);
        }
        catalog
    }

    pub fn all(&self) -> &[Arc<Device>] {
        &self.all
    }

    pub fn online(&self) -> &[Arc<Device>] {
        &self.online
    }

    pub fn offline(&self) -> &[Arc<Device>] {
        &self.offline
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            total: self.all.len(),
            online: self.online.len(),
            offline: self.offline.len(),
        }
    }

    /// Search by name or software version, case-insensitively.
    ///
    /// Exact matches win outright: when any device's name or software
    /// version equals the query, only those are returned. Otherwise the
    /// result is every device whose name or software version contains the
    /// query as a substring. Keeps catalog order either way.
    pub fn search(&self, query: &str) -> Vec<Arc<Device>> {
        let needle = query.to_lowercase();

        let exact: Vec<_> = self
            .all
            .iter()
            .filter(|d| {
                d.display_name().to_lowercase() == needle
                    || d.software_version()
                        .is_some_and(|v| v.to_lowercase() == needle)
            })
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        self.all
            .iter()
            .filter(|d| {
                d.display_name().to_lowercase().contains(&needle)
                    || d.software_version()
                        .is_some_and(|v| v.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Find the single device with the given subscriber identity.
    pub fn find_by_identity(&self, imsi: &str) -> Option<Arc<Device>> {
        self.all
            .iter()
            .find(|d| d.identity() == Some(imsi))
            .cloned()
    }
}

/// Loads the device inventory: cache first, then the paginated API.
pub struct Inventory<'a> {
    api: &'a ApiClient,
    cache: CacheStore,
    filters: SubscriberFilters,
    options: FetchOptions,
}

impl<'a> Inventory<'a> {
    pub fn new(api: &'a ApiClient, cache: CacheStore) -> Self {
        Self {
            api,
            cache,
            filters: SubscriberFilters::default(),
            options: FetchOptions::default(),
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: SubscriberFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the catalog.
    ///
    /// With `use_cache` set and `force_refresh` unset, a fresh cached
    /// snapshot short-circuits the network entirely. After an API fetch the
    /// snapshot is written back when non-empty; a write failure only warns,
    /// the fetched data is still returned.
    pub async fn load(
        &self,
        use_cache: bool,
        force_refresh: bool,
    ) -> Result<DeviceCatalog, CoreError> {
        if use_cache && !force_refresh {
            if let Some(records) = self.cache.read() {
                debug!(count = records.len(), "loaded inventory from cache");
                return Ok(DeviceCatalog::from_records(records));
            }
        }

        let records = self
            .api
            .fetch_all_subscribers(&self.filters, &self.options)
            .await?;
        info!(count = records.len(), "fetched inventory from API");

        // Write-through is unconditional: even a `use_cache = false`
        // invocation leaves a snapshot a later cached one can reuse.
        if !records.is_empty() {
            if let Err(e) = self.cache.write(&records) {
                warn!(error = %e, "failed to write inventory cache");
            }
        }
        Ok(DeviceCatalog::from_records(records))
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }
}
