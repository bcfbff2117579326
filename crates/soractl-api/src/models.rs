// Wire types shared across the API surfaces.
//
// Subscriber records stay loosely typed: the provider returns a flat
// attribute map whose population varies per account and SIM generation,
// so the domain layer resolves fields by probing rather than by schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw subscriber record as returned by `GET /subscribers`.
///
/// Transparent wrapper over the provider's attribute map. Field resolution
/// (identity, online state, name) lives on `soractl_core::Device`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceRecord(serde_json::Map<String, Value>);

impl DeviceRecord {
    pub fn new(map: serde_json::Map<String, Value>) -> Self {
        Self(map)
    }

    /// Raw attribute lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Top-level string attribute, if present and non-empty.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// The `tags` map, if present.
    pub fn tags(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("tags").and_then(Value::as_object)
    }

    /// String tag value, if present and non-empty.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags()
            .and_then(|t| t.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Set a top-level attribute, replacing any previous value.
    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_owned(), value);
    }

    /// Iterate over all top-level attributes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Provider-side bandwidth tier for a subscriber's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedClass {
    #[serde(rename = "s1.slow")]
    Slow,
    #[serde(rename = "s1.fast")]
    Fast,
}

impl SpeedClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "s1.slow",
            Self::Fast => "s1.fast",
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeedClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slow" | "s1.slow" => Ok(Self::Slow),
            "fast" | "s1.fast" => Ok(Self::Fast),
            other => Err(format!("unknown speed class '{other}' (expected slow or fast)")),
        }
    }
}

/// Request body for `POST /port_mappings`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortMappingRequest {
    pub destination: PortMappingDestination,
    /// Mapping lifetime in seconds; the provider expires it server-side.
    pub duration: u64,
    /// Source ranges allowed to connect, e.g. `["203.0.113.7/32"]`.
    pub ip_ranges: Vec<String>,
    pub tls_required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortMappingDestination {
    pub imsi: String,
    pub port: u16,
}

impl PortMappingRequest {
    /// Mapping to the device's SSH port. `source_range` narrows access to
    /// the caller's own address; `None` falls back to the open range.
    pub fn ssh(imsi: &str, duration: u64, source_range: Option<String>) -> Self {
        Self {
            destination: PortMappingDestination {
                imsi: imsi.to_owned(),
                port: 22,
            },
            duration,
            ip_ranges: vec![source_range.unwrap_or_else(|| "0.0.0.0/0".to_owned())],
            tls_required: false,
        }
    }
}

/// An active on-demand port mapping, from a `201 Created` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMapping {
    /// Provider-assigned mapping id, used for deletion.
    pub id: String,
    pub hostname: String,
    pub port: u16,
    /// Server-side expiry (epoch millis), when reported.
    #[serde(default, rename = "expiredTime")]
    pub expired_time: Option<i64>,
}
