use thiserror::Error;

/// Top-level error type for the `soractl-api` crate.
///
/// Covers every failure mode across the API surfaces: authentication,
/// transport, and the provider's JSON endpoints. `soractl-core` maps these
/// into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// 401/403 from the provider: invalid or expired credentials.
    /// Always fatal to the current operation, never retried.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response outside the auth range, with the raw body so the
    /// caller can distinguish identity errors from capacity errors.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` for credential failures (401/403), which abort the
    /// whole operation instead of being retried.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this error is worth retrying with backoff:
    /// timeouts, connection errors, and any non-auth HTTP error status.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { .. } => true,
            _ => false,
        }
    }

    /// Returns `true` for connection-level faults, which get a longer
    /// backoff than plain timeouts or server errors.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_connect())
    }
}
