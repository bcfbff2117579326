//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and API errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use soractl_core::CoreError;

/// Exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    /// The update timed out without a completion signal; the device may
    /// still have updated.
    pub const AMBIGUOUS: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(soractl::auth_failed),
        help(
            "Verify the credentials for profile '{profile}'.\n\
             Run: soractl config set-password\n\
             Or set SORACOM_API_KEY and SORACOM_TOKEN."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(soractl::no_credentials),
        help(
            "Configure credentials with: soractl config init\n\
             Or set SORACOM_API_KEY and SORACOM_TOKEN."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("No device matches '{query}'")]
    #[diagnostic(
        code(soractl::device_not_found),
        help("Run: soractl devices list to see the inventory\n\
              (add --refresh if the device was registered recently)")
    )]
    DeviceNotFound { query: String },

    #[error("'{query}' matches {count} devices")]
    #[diagnostic(
        code(soractl::ambiguous_device),
        help("Matched: {matches}\nNarrow the query or use the device's IMSI.")
    )]
    AmbiguousDevice {
        query: String,
        count: usize,
        matches: String,
    },

    #[error("Device '{device}' has no resolvable subscriber identity")]
    #[diagnostic(
        code(soractl::missing_identity),
        help("The record carries no IMSI in any known field; fix the record\n\
              in the provider console before operating on this device.")
    )]
    MissingIdentity { device: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error (HTTP {status}): {message}")]
    #[diagnostic(code(soractl::api_error))]
    Api { status: u16, message: String },

    #[error("Could not reach the API endpoint")]
    #[diagnostic(
        code(soractl::connection_failed),
        help("Check network connectivity and the endpoint URL.\nEndpoint: {url}")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(soractl::timeout),
        help("Increase the timeout with --timeout or check connectivity.")
    )]
    Timeout { seconds: u64 },

    // ── Update outcome ───────────────────────────────────────────────

    #[error("Update for '{device}' timed out without a completion signal")]
    #[diagnostic(
        code(soractl::ambiguous_update),
        help(
            "The update may still have completed on the device.\n\
             Verify with: soractl devices show '{device}' --refresh"
        )
    )]
    AmbiguousUpdate { device: String },

    #[error("Update for '{device}' failed: {reason}")]
    #[diagnostic(code(soractl::update_failed))]
    UpdateFailed { device: String, reason: String },

    // ── Validation / config ──────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(soractl::validation))]
    Validation { field: String, reason: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(soractl::profile_not_found),
        help("Available profiles: {available}\nCreate one with: soractl config init")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(soractl::config))]
    Config(Box<figment::Error>),

    // ── IO / session leftovers ───────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Session cleanup incomplete: {detail}")]
    #[diagnostic(
        code(soractl::cleanup_incomplete),
        help("The port mapping expires server-side; the speed class may need\n\
              restoring manually: soractl speed set '{device}' slow")
    )]
    CleanupIncomplete { device: String, detail: String },
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AmbiguousUpdate { .. } => exit_code::AMBIGUOUS,
            Self::Validation { .. } | Self::AmbiguousDevice { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Error mapping ────────────────────────────────────────────────────

pub fn map_api_error(err: soractl_api::Error, profile: &str, endpoint: &str, timeout: u64) -> CliError {
    match err {
        soractl_api::Error::Authentication { message } => CliError::AuthFailed {
            profile: profile.to_owned(),
            message,
        },
        soractl_api::Error::Api { status, message } => CliError::Api { status, message },
        soractl_api::Error::Transport(e) if e.is_timeout() => CliError::Timeout { seconds: timeout },
        soractl_api::Error::Transport(e) => CliError::ConnectionFailed {
            url: endpoint.to_owned(),
            source: Box::new(e),
        },
        other => CliError::Api {
            status: 0,
            message: other.to_string(),
        },
    }
}

pub fn map_core_error(err: CoreError, profile: &str, endpoint: &str, timeout: u64) -> CliError {
    match err {
        CoreError::Api(api) => map_api_error(api, profile, endpoint, timeout),
        CoreError::MissingIdentity { device } => CliError::MissingIdentity { device },
        CoreError::Io(e) => CliError::Io(e),
        other => CliError::Validation {
            field: "session".into(),
            reason: other.to_string(),
        },
    }
}
