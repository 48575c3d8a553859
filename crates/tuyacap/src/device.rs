//! Device-side data model: data point codes, encoding tags, and the
//! per-device configuration snapshot supplied by the pairing layer.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use strum::Display;
use strum::EnumString;

/// Vendor-assigned identifier for one data point channel on a device
/// (e.g. a switch state or a brightness level).
///
/// Codes are opaque and stable; they come from the vendor catalog or from
/// the device itself and are never invented at runtime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DpCode(String);

impl DpCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DpCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for DpCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// How a data point's raw value is encoded, using the vendor's spelling
/// on the wire (`"Boolean"`, `"Enum"`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum DpType {
    Boolean,
    Enum,
    Integer,
    Json,
    Raw,
    String,
}

/// One data point as physically present on a device: its raw value and
/// the encoding it was reported with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub value: serde_json::Value,

    #[serde(rename = "type")]
    pub dp_type: DpType,
}

impl DataPoint {
    pub fn new(value: impl Into<serde_json::Value>, dp_type: DpType) -> Self {
        Self {
            value: value.into(),
            dp_type,
        }
    }
}

fn default_scale_factor() -> f64 {
    1.0
}

/// Snapshot of one device's configuration, as supplied by the external
/// pairing / local-network layer. May be incomplete; the resolver treats
/// it as read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Product name / model string reported by the device. Descriptor
    /// applicability gates match substrings of this.
    pub model: String,

    /// Device-declared multiplier applied to scaled numeric cloud values.
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Data points present on the device.
    #[serde(default)]
    dps: BTreeMap<DpCode, DataPoint>,
}

impl DeviceConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            scale_factor: default_scale_factor(),
            dps: BTreeMap::new(),
        }
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_dp(mut self, code: impl Into<DpCode>, dp: DataPoint) -> Self {
        self.dps.insert(code.into(), dp);
        self
    }

    pub fn get(&self, code: &DpCode) -> Option<&DataPoint> {
        self.dps.get(code)
    }

    pub fn contains(&self, code: &DpCode) -> bool {
        self.dps.contains_key(code)
    }

    pub fn dps(&self) -> impl Iterator<Item = (&DpCode, &DataPoint)> {
        self.dps.iter()
    }
}
