//! CLI-owned configuration: TOML profiles and credential resolution.
//!
//! The api/core crates never see these types -- they receive a pre-built
//! `ApiClient` or `Credentials`.

use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub const DEFAULT_ENDPOINT: &str = "https://g.api.soracom.io/v1";
const KEYRING_SERVICE: &str = "soractl";

// ── TOML config structs ──────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name (used when --profile is not specified).
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether the inventory cache is consulted by default.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            use_cache: default_use_cache(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_use_cache() -> bool {
    true
}

/// One account profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// API endpoint; defaults to the global coverage endpoint.
    pub endpoint: Option<String>,

    /// Account email for the login flow.
    pub email: Option<String>,

    /// Account password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// SSH username on the devices.
    pub ssh_user: Option<String>,

    /// SSH password on the devices (plaintext -- prefer keyring).
    pub ssh_password: Option<String>,
}

// ── Config file path ─────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "vapor-systems", "soractl")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .unwrap_or_else(|| {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("soractl");
            p.push("config.toml");
            p
        })
}

// ── Config loading / saving ──────────────────────────────────────────

/// Load the full config from file + environment.
pub fn load_config() -> Result<Config, CliError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("SORACTL_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist or is broken.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Write the config file, creating parent directories as needed.
pub fn save_config(cfg: &Config) -> Result<(), CliError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
        field: "config".into(),
        reason: format!("could not serialize configuration: {e}"),
    })?;
    std::fs::write(&path, body)?;
    Ok(())
}

// ── Profile resolution ───────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Effective API endpoint: flag > profile > built-in default.
pub fn resolve_endpoint(global: &GlobalOpts, profile: Option<&Profile>) -> String {
    global
        .endpoint
        .clone()
        .or_else(|| profile.and_then(|p| p.endpoint.clone()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned())
}

/// How the client should authenticate for this invocation.
pub enum AuthSource {
    /// Direct api-key/token pair (flags or env); no login round-trip.
    Direct(soractl_api::Credentials),
    /// Email + password login.
    Login { email: String, password: SecretString },
}

/// Resolve credentials from the chain: flags/env pair > profile email with
/// password from env > keyring > plaintext > interactive prompt.
pub fn resolve_auth(
    global: &GlobalOpts,
    profile: Option<&Profile>,
    profile_name: &str,
) -> Result<AuthSource, CliError> {
    if let (Some(key), Some(token)) = (&global.api_key, &global.token) {
        return Ok(AuthSource::Direct(soractl_api::Credentials::new(
            key.clone(),
            token.clone(),
        )));
    }

    let email = profile
        .and_then(|p| p.email.clone())
        .or_else(|| std::env::var("SORACOM_EMAIL").ok())
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;

    let password = resolve_password(profile, profile_name)?;
    Ok(AuthSource::Login { email, password })
}

fn resolve_password(profile: Option<&Profile>, profile_name: &str) -> Result<SecretString, CliError> {
    if let Ok(pw) = std::env::var("SORACOM_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    if let Some(env_name) = profile.and_then(|p| p.password_env.as_deref()) {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(pw) = profile.and_then(|p| p.password.clone()) {
        return Ok(SecretString::from(pw));
    }

    let pw = rpassword::prompt_password("Account password: ").map_err(|e| CliError::Validation {
        field: "password".into(),
        reason: format!("prompt failed: {e}"),
    })?;
    if pw.is_empty() {
        return Err(CliError::NoCredentials {
            profile: profile_name.to_owned(),
        });
    }
    Ok(SecretString::from(pw))
}

/// Resolve the device SSH password: env > keyring > plaintext > none.
pub fn resolve_ssh_password(profile: Option<&Profile>, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var("SORACTL_SSH_PASSWORD") {
        return Some(SecretString::from(pw));
    }
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/ssh-password"))
    {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }
    profile
        .and_then(|p| p.ssh_password.clone())
        .map(SecretString::from)
}

/// Store a secret under this profile in the system keyring.
pub fn store_in_keyring(profile_name: &str, slot: &str, secret: &str) -> Result<(), CliError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{slot}")).map_err(
        |e| CliError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        },
    )?;
    entry.set_password(secret).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    })
}
