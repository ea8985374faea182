//! Device catalog input: one entry per device with its attributes
//! (readable variables) and functions (callable statements).

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ImportError;
use crate::model::{ArgumentSpec, ValueType};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_name: String,
    #[serde(default)]
    pub attributes: Vec<DeviceAttribute>,
    #[serde(default)]
    pub functions: Vec<DeviceFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceFunction {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
}

/// Parse a device list. The top level must be an array; entries that do
/// not decode are skipped.
pub fn parse_devices(json: &str) -> Result<Vec<Device>, ImportError> {
    let root: Value = serde_json::from_str(json)?;
    let entries = root
        .as_array()
        .ok_or_else(|| ImportError::malformed("$", "device list must be an array"))?;

    let mut devices = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        match Device::deserialize(entry) {
            Ok(device) if !device.device_name.is_empty() => devices.push(device),
            Ok(_) => warn!(index = i, "skipping device without a name"),
            Err(e) => warn!(index = i, error = %e, "skipping malformed device"),
        }
    }
    Ok(devices)
}
