//! Update orchestration.
//!
//! Sequences a device update end to end: raise the speed class so the
//! download is quick, open a remote-access session, drive the update script,
//! classify the outcome, then release everything. The release step runs on
//! every path, including early bail-outs, and both of its actions (restore
//! slow speed, close session) are attempted independently.

use std::sync::Arc;

use soractl_api::{ApiClient, SpeedClass};
use tracing::{info, warn};

use crate::cleanup::CleanupContext;
use crate::error::CoreError;
use crate::model::Device;
use crate::remote::{RemoteCommandDriver, ScriptOutcome};
use crate::session::RemoteAccessSession;

/// Final classification of an update run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The script completed, or the connection dropped the way a rebooting
    /// device drops it.
    Succeeded,
    /// The script went silent past its deadline. The update may still have
    /// finished on-device; the operator must verify.
    AmbiguousTimeout,
    Failed(String),
}

/// What an update run did, including how cleanup went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub status: UpdateStatus,
    /// Whether the speed class was restored to slow during release.
    pub speed_restored: bool,
    /// Whether the port mapping was deleted during release.
    pub session_closed: bool,
}

/// Runs device updates with guaranteed resource release.
pub struct UpdateOrchestrator<'a, D: RemoteCommandDriver> {
    api: &'a ApiClient,
    driver: D,
    cleanup: Arc<CleanupContext>,
    source_range: Option<String>,
}

impl<'a, D: RemoteCommandDriver> UpdateOrchestrator<'a, D> {
    pub fn new(api: &'a ApiClient, driver: D, cleanup: Arc<CleanupContext>) -> Self {
        Self {
            api,
            driver,
            cleanup,
            source_range: None,
        }
    }

    /// Restrict the session's port mapping to this source range.
    #[must_use]
    pub fn with_source_range(mut self, range: Option<String>) -> Self {
        self.source_range = range;
        self
    }

    /// Run the update against one device.
    ///
    /// Fails fast only when the device has no resolvable identity; every
    /// other problem is reported through [`UpdateOutcome::status`] so the
    /// release step still runs inside this call.
    pub async fn run_update(&mut self, device: &Device) -> Result<UpdateOutcome, CoreError> {
        let imsi = device
            .identity()
            .ok_or_else(|| CoreError::MissingIdentity {
                device: device.display_name().to_owned(),
            })?
            .to_owned();

        info!(imsi, device = device.display_name(), "starting update run");

        let mut session = RemoteAccessSession::new(self.api);
        let status = self.execute(&imsi, device, &mut session).await;
        let (speed_restored, session_closed) = self.release(&imsi, &mut session).await;

        Ok(UpdateOutcome {
            status,
            speed_restored,
            session_closed,
        })
    }

    /// The forward path: raise speed, open session, drive the script.
    async fn execute(
        &mut self,
        imsi: &str,
        device: &Device,
        session: &mut RemoteAccessSession<'_>,
    ) -> UpdateStatus {
        // Restore-to-slow is tracked before the raise: even if the raise
        // fails the restore is harmless, and an interrupt between the two
        // must not leave the device fast.
        self.cleanup.track_speed_restore(imsi).await;
        match self.api.update_speed_class(imsi, SpeedClass::Fast).await {
            Ok(()) => info!(imsi, "speed class raised for update"),
            // Not fatal: the update just downloads slower.
            Err(e) => warn!(imsi, error = %e, "failed to raise speed class; continuing"),
        }

        let conn = match session.open(device, self.source_range.clone()).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(imsi, error = %e, "failed to open remote session");
                return UpdateStatus::Failed(format!("could not open remote session: {e}"));
            }
        };
        if let Some(id) = session.mapping_id() {
            self.cleanup.track_mapping(id).await;
        }

        match self.driver.run_update(&conn).await {
            ScriptOutcome::Completed => {
                info!(imsi, "update completed");
                UpdateStatus::Succeeded
            }
            ScriptOutcome::RebootDetected => {
                info!(imsi, "device rebooted during update; treating as success");
                UpdateStatus::Succeeded
            }
            ScriptOutcome::TimedOut => {
                warn!(imsi, "update timed out without a completion signal");
                UpdateStatus::AmbiguousTimeout
            }
            ScriptOutcome::Failed(msg) => {
                warn!(imsi, error = msg, "update script failed");
                UpdateStatus::Failed(msg)
            }
        }
    }

    /// The release path: restore slow speed and close the session, each
    /// attempted regardless of the other's result.
    async fn release(
        &mut self,
        imsi: &str,
        session: &mut RemoteAccessSession<'_>,
    ) -> (bool, bool) {
        let speed_restored = match self.api.update_speed_class(imsi, SpeedClass::Slow).await {
            Ok(()) => {
                info!(imsi, "speed class restored to slow");
                self.cleanup.clear_speed_restore().await;
                true
            }
            Err(e) => {
                warn!(imsi, error = %e, "failed to restore speed class");
                false
            }
        };

        let session_closed = match session.close().await {
            Ok(()) => {
                self.cleanup.clear_mapping().await;
                true
            }
            Err(e) => {
                warn!(imsi, error = %e, "failed to close remote session");
                false
            }
        };

        (speed_restored, session_closed)
    }
}
