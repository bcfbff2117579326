//! Device model and field resolvers.
//!
//! Provider records are loosely populated: depending on the SIM vintage and
//! how the device was registered, the subscriber identity, online state, and
//! name live in different fields. [`Device`] wraps the raw record and probes
//! the known locations in a fixed priority order, so the rest of the crate
//! never touches raw JSON.

use std::fmt;

use chrono::{DateTime, Utc};
use soractl_api::DeviceRecord;

/// Returns `true` if `candidate` looks like a subscriber identity:
/// exactly 15 ASCII digits.
pub fn is_valid_imsi(candidate: &str) -> bool {
    candidate.len() == 15 && candidate.bytes().all(|b| b.is_ascii_digit())
}

/// Immutable view over a raw subscriber record.
#[derive(Debug, Clone)]
pub struct Device {
    record: DeviceRecord,
}

impl Device {
    pub fn new(record: DeviceRecord) -> Self {
        Self { record }
    }

    /// Access to the underlying raw record.
    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    /// Resolve the subscriber identity (IMSI).
    ///
    /// Probes, in order: `imsi`, `IMSI`, `subscriberId`, `simId`, the same
    /// names inside `tags`, then falls back to scanning every top-level
    /// string field for a 15-digit value.
    pub fn identity(&self) -> Option<&str> {
        const FIELDS: [&str; 4] = ["imsi", "IMSI", "subscriberId", "simId"];

        for field in FIELDS {
            if let Some(value) = self.record.str_field(field) {
                if is_valid_imsi(value) {
                    return Some(value);
                }
            }
        }
        for field in FIELDS {
            if let Some(value) = self.record.tag(field) {
                if is_valid_imsi(value) {
                    return Some(value);
                }
            }
        }
        // Last resort: any top-level string that looks like an IMSI.
        self.record
            .iter()
            .filter_map(|(_, v)| v.as_str())
            .find(|v| is_valid_imsi(v))
    }

    /// Whether the provider considers this subscriber attached right now.
    ///
    /// Three encodings exist in the wild: a top-level `online` boolean, a
    /// `sessionStatus` object with an `online` boolean, and (from older
    /// exports) `sessionStatus` serialized as a Python-repr string.
    pub fn is_online(&self) -> bool {
        if let Some(online) = self.record.get("online").and_then(|v| v.as_bool()) {
            return online;
        }
        match self.record.get("sessionStatus") {
            Some(status) if status.is_object() => status
                .get("online")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            Some(status) => status
                .as_str()
                .is_some_and(|s| s.contains("'online': True")),
            None => false,
        }
    }

    /// Human-facing name: `name` field, `tagName`, `tags.name`, or a
    /// placeholder when nothing is set.
    pub fn display_name(&self) -> &str {
        self.record
            .str_field("name")
            .or_else(|| self.record.str_field("tagName"))
            .or_else(|| self.record.tag("name"))
            .filter(|s| !s.is_empty())
            .unwrap_or("Unnamed Device")
    }

    /// Installed software version, recorded as the `S/W Version` tag.
    pub fn software_version(&self) -> Option<&str> {
        self.record.tag("S/W Version").filter(|s| !s.is_empty())
    }

    /// When the provider last saw this subscriber, if recorded.
    ///
    /// `lastModifiedAt` / `lastSeen` carry epoch milliseconds.
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.record
            .get("lastModifiedAt")
            .or_else(|| self.record.get("lastSeen"))
            .and_then(serde_json::Value::as_i64)
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Device IMEI when the provider reports one.
    pub fn imei(&self) -> Option<&str> {
        self.record.str_field("imei").filter(|s| !s.is_empty())
    }

    /// Copy of this device with the given identity written into the `imsi`
    /// field. Used when an operator supplies an identity for a record the
    /// resolvers could not place one on.
    #[must_use]
    pub fn with_identity(&self, imsi: &str) -> Self {
        let mut record = self.record.clone();
        record.set("imsi", serde_json::Value::String(imsi.to_owned()));
        Self { record }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())?;
        if let Some(imsi) = self.identity() {
            write!(f, " ({imsi})")?;
        }
        Ok(())
    }
}

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        Self::new(record)
    }
}

// Serializes as the raw record, so JSON output shows the full attribute map.
impl serde::Serialize for Device {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.record.serialize(serializer)
    }
}
