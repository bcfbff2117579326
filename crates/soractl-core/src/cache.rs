//! File-backed inventory cache.
//!
//! A full inventory fetch walks every page of the subscriber list, which is
//! slow and rate-limited. The snapshot is cached on disk for a short TTL so
//! repeated invocations within a session reuse it. Any read problem
//! (missing, malformed, expired, empty) degrades to a miss; the cache is
//! never load-bearing.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use soractl_api::DeviceRecord;
use tracing::{debug, warn};

use crate::error::CoreError;

/// How long a cached snapshot stays valid.
pub const CACHE_TTL: Duration = Duration::from_secs(600);

const CACHE_FILE: &str = "devices_cache.json";

/// On-disk snapshot format: write timestamp plus the raw records.
#[derive(Debug, Serialize, Deserialize)]
pub struct InventorySnapshot {
    /// Seconds since the Unix epoch at write time.
    pub timestamp: f64,
    pub devices: Vec<DeviceRecord>,
}

/// Read-through cache for the device inventory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    /// Cache at an explicit file path with the default TTL.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: CACHE_TTL,
        }
    }

    /// Cache in the platform cache directory (`~/.cache/soractl` on Linux).
    /// Falls back to the current directory when no home is resolvable.
    pub fn in_cache_dir() -> Self {
        let dir = directories::ProjectDirs::from("io", "vapor-systems", "soractl")
            .map_or_else(|| PathBuf::from("."), |d| d.cache_dir().to_owned());
        Self::at_path(dir.join(CACHE_FILE))
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached records if a fresh, non-empty snapshot exists.
    ///
    /// Missing file, unreadable JSON, an empty device list, or an expired
    /// timestamp all return `None`. A snapshot whose age equals the TTL
    /// exactly is still valid.
    pub fn read(&self) -> Option<Vec<DeviceRecord>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "cache miss: unreadable");
                return None;
            }
        };
        let snapshot: InventorySnapshot = match serde_json::from_str(&raw) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache miss: malformed snapshot");
                return None;
            }
        };
        if snapshot.devices.is_empty() {
            debug!("cache miss: empty snapshot");
            return None;
        }
        let age = now_epoch_secs() - snapshot.timestamp;
        if age < 0.0 || age > self.ttl.as_secs_f64() {
            debug!(age, "cache miss: snapshot expired");
            return None;
        }
        debug!(age, count = snapshot.devices.len(), "cache hit");
        Some(snapshot.devices)
    }

    /// Write a snapshot atomically (temp file in the same directory, then
    /// rename over the target).
    pub fn write(&self, devices: &[DeviceRecord]) -> Result<(), CoreError> {
        let snapshot = InventorySnapshot {
            timestamp: now_epoch_secs(),
            devices: devices.to_vec(),
        };
        let body = serde_json::to_string(&snapshot).map_err(|e| {
            CoreError::Io(std::io::Error::other(format!(
                "failed to serialize cache snapshot: {e}"
            )))
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), count = devices.len(), "cache written");
        Ok(())
    }

    /// Remove the cache file. Already-absent is success.
    pub fn clear(&self) -> Result<(), CoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
