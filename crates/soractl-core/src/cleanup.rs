//! Shared cleanup ledger for interrupted update runs.
//!
//! The orchestrator records which resources it currently holds (a raised
//! speed class, an open port mapping) so the process interrupt handler can
//! release the same resources if the operator hits ctrl-c mid-run. Both
//! sides go through this one ledger; releasing twice is harmless because
//! each entry is taken out under the lock.

use soractl_api::{ApiClient, SpeedClass};
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct Held {
    /// IMSI whose speed class must be restored to slow.
    restore_identity: Option<String>,
    /// Port mapping that must be deleted.
    mapping_id: Option<String>,
}

/// Tracks resources that must be released however the run ends.
#[derive(Debug, Default)]
pub struct CleanupContext {
    held: Mutex<Held>,
}

impl CleanupContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `imsi` has been raised and needs restoring.
    pub async fn track_speed_restore(&self, imsi: &str) {
        self.held.lock().await.restore_identity = Some(imsi.to_owned());
    }

    /// Record an open port mapping.
    pub async fn track_mapping(&self, id: &str) {
        self.held.lock().await.mapping_id = Some(id.to_owned());
    }

    /// Forget the speed restore (already performed elsewhere).
    pub async fn clear_speed_restore(&self) {
        self.held.lock().await.restore_identity = None;
    }

    /// Forget the mapping (already deleted elsewhere).
    pub async fn clear_mapping(&self) {
        self.held.lock().await.mapping_id = None;
    }

    /// Release everything currently held, best-effort.
    ///
    /// Both actions run independently; a failed speed restore never skips
    /// the mapping delete. Entries are taken out before the API calls, so
    /// a concurrent release cannot repeat them.
    pub async fn release(&self, api: &ApiClient) {
        let held = {
            let mut guard = self.held.lock().await;
            Held {
                restore_identity: guard.restore_identity.take(),
                mapping_id: guard.mapping_id.take(),
            }
        };

        if let Some(imsi) = held.restore_identity {
            match api.update_speed_class(&imsi, SpeedClass::Slow).await {
                Ok(()) => info!(imsi, "speed class restored to slow"),
                Err(e) => warn!(imsi, error = %e, "failed to restore speed class"),
            }
        }
        if let Some(id) = held.mapping_id {
            match api.delete_port_mapping(&id).await {
                Ok(()) => info!(id, "port mapping deleted"),
                Err(e) => warn!(id, error = %e, "failed to delete port mapping"),
            }
        }
    }

    /// Whether anything is currently tracked.
    pub async fn is_empty(&self) -> bool {
        let guard = self.held.lock().await;
        guard.restore_identity.is_none() && guard.mapping_id.is_none()
    }
}
