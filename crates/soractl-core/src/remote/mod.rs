//! Remote command execution over an open session.
//!
//! The orchestrator only needs "run the update against this endpoint and
//! tell me how it ended", so the driver is a trait; the SSH implementation
//! lives in [`ssh`], and tests substitute a scripted fake.

pub mod expect;
pub mod ssh;

use crate::session::ConnectionInfo;

/// How a scripted remote run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The script reported completion.
    Completed,
    /// The connection dropped in a way consistent with the device
    /// rebooting mid-update. Treated as likely-success downstream.
    RebootDetected,
    /// No completion signal within the allotted time. Genuinely ambiguous:
    /// the update may still finish on-device.
    TimedOut,
    /// The run failed with a diagnosable error.
    Failed(String),
}

/// Executes the update command sequence against a connection endpoint.
pub trait RemoteCommandDriver {
    fn run_update(
        &mut self,
        conn: &ConnectionInfo,
    ) -> impl Future<Output = ScriptOutcome> + Send;
}
