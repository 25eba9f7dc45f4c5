// ── Device domain types ──

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Reachability state of a monitored device.
///
/// Serialized with the variant name (`"Pending"`, `"Connected"`,
/// `"Disconnected"`), which is also the on-disk representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum DeviceStatus {
    /// Never polled since it was added.
    #[default]
    Pending,
    Connected,
    Disconnected,
}

impl DeviceStatus {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// `true` once at least one poll cycle has produced a verdict.
    pub fn is_polled(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One monitored host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub name: String,
    /// Identity key. Stored in canonical textual form.
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub status: DeviceStatus,
}

impl DeviceRecord {
    /// Parsed address, if the stored key is a valid IP.
    pub fn addr(&self) -> Option<IpAddr> {
        self.ip.parse().ok()
    }

    /// Copy of this record carrying a different status.
    pub fn with_status(&self, status: DeviceStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}

/// Input for [`Registry::add`](crate::Registry::add).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
}

impl NewDevice {
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }

    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Validate required fields and build a `Pending` record.
    pub(crate) fn into_record(self) -> Result<DeviceRecord, CoreError> {
        let name = require("name", &self.name)?;
        let ip = canonical_ip(&require("ip", &self.ip)?)?;

        Ok(DeviceRecord {
            name,
            ip,
            site: non_blank(self.site),
            location: non_blank(self.location),
            device_type: non_blank(self.device_type),
            status: DeviceStatus::Pending,
        })
    }
}

/// Replacement for the mutable fields of an existing record.
///
/// Every field is replaced: `None` clears the stored metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUpdate {
    pub name: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
}

impl DeviceUpdate {
    /// Start from the current field values of `record`.
    pub fn from_record(record: &DeviceRecord) -> Self {
        Self {
            name: record.name.clone(),
            site: record.site.clone(),
            location: record.location.clone(),
            device_type: record.device_type.clone(),
        }
    }

    pub(crate) fn apply_to(self, record: &mut DeviceRecord) -> Result<(), CoreError> {
        record.name = require("name", &self.name)?;
        record.site = non_blank(self.site);
        record.location = non_blank(self.location);
        record.device_type = non_blank(self.device_type);
        Ok(())
    }
}

/// Emitted when a poll cycle flips a device's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub ip: String,
    pub name: String,
    pub from: DeviceStatus,
    pub to: DeviceStatus,
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Normalize a user-supplied key so lookups match stored records.
///
/// Valid addresses are rewritten in canonical form (`::FFFF:1` and
/// `::ffff:1` name the same device); anything else is only trimmed so
/// hand-edited data files stay addressable.
pub fn normalize_key(ip: &str) -> String {
    let trimmed = ip.trim();
    trimmed
        .parse::<IpAddr>()
        .map_or_else(|_| trimmed.to_owned(), |addr| addr.to_string())
}

fn canonical_ip(ip: &str) -> Result<String, CoreError> {
    ip.parse::<IpAddr>()
        .map(|addr| addr.to_string())
        .map_err(|_| CoreError::validation("ip", format!("'{ip}' is not an IPv4 or IPv6 address")))
}

fn require(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "is required"));
    }
    Ok(trimmed.to_owned())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
