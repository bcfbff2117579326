use thiserror::Error;

/// Error type for the domain layer.
///
/// Expected failure modes (missing identity, session misuse) are explicit
/// variants so callers can branch on them; provider failures pass through
/// from `soractl-api`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Provider API failure, including fatal auth errors.
    #[error(transparent)]
    Api(#[from] soractl_api::Error),

    /// The device record resolves to no subscriber identity, so no
    /// per-subscriber API call can be made. Fail-fast, no network.
    #[error("no subscriber identity (IMSI) could be resolved for device '{device}'")]
    MissingIdentity { device: String },

    /// A closed session cannot be reopened; create a fresh one.
    #[error("remote access session is closed and cannot be reused")]
    SessionClosed,

    /// `open()` called while a session is already being established or active.
    #[error("remote access session is already open")]
    SessionAlreadyOpen,

    /// Local I/O failure (cache file handling, child process spawn).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns `true` if this wraps a fatal credential failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth())
    }
}
