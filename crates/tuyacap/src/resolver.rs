//! Capability descriptor resolution.
//!
//! A pure, synchronous pass over immutable inputs: one descriptor, one
//! device configuration snapshot, one optional cloud bundle. Produces a
//! freshly allocated [`ResolvedCapability`] (or a "not applicable" /
//! "missing data points" outcome) and never mutates its inputs.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cloud::CloudSource;
use crate::cloud::CloudValueSpec;
use crate::cloud::Coercion;
use crate::cloud::LabelSetKind;
use crate::cloud::NumericKind;
use crate::descriptor::CapabilityDescriptor;
use crate::descriptor::EntityMetadata;
use crate::descriptor::FieldSpec;
use crate::device::DeviceConfig;
use crate::device::DpCode;

/// Per-device output of resolving one descriptor: every cloud rule already
/// resolved (or defaulted), every data point role checked. Owned
/// exclusively by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCapability {
    pub meta: EntityMetadata,

    /// Semantic field name -> concrete value, in declaration order.
    pub fields: serde_json::Map<String, Value>,

    /// Recovered coercion failures; diagnostics only, never fatal.
    #[serde(skip)]
    pub warnings: Vec<CoercionWarning>,
}

/// A cloud value that could not be coerced to the requested type. The
/// field already took its default; this only records what was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CoercionWarning {
    pub field: String,
    pub raw: Value,
}

/// Why a descriptor failed to resolve for a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// A non-optional data point role has no entry on the device. Fatal
    /// to this descriptor only; siblings keep resolving.
    #[error("required data point `{code}` (field `{field}`) is not present on the device")]
    MissingRequiredDataPoint { field: String, code: DpCode },
}

/// Outcome of resolving one descriptor against one device.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedCapability),

    /// The descriptor's model gate rejected this device. A skip, not an
    /// error; no cloud lookups were performed.
    NotApplicable,

    /// Required data points were missing. `partial` still carries every
    /// sibling field that did resolve.
    Failed {
        partial: ResolvedCapability,
        errors: Vec<ResolutionError>,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn is_not_applicable(&self) -> bool {
        matches!(self, Resolution::NotApplicable)
    }

    /// The fully resolved capability, if resolution succeeded.
    pub fn capability(&self) -> Option<&ResolvedCapability> {
        match self {
            Resolution::Resolved(capability) => Some(capability),
            _ => None,
        }
    }
}

/// Resolve one descriptor against a device snapshot and its optional
/// cloud bundle.
///
/// The applicability gate is evaluated before anything else; an
/// inapplicable descriptor performs no cloud lookups at all.
pub fn resolve(
    descriptor: &CapabilityDescriptor,
    device: &DeviceConfig,
    cloud: Option<&dyn CloudSource>,
) -> Resolution {
    if !descriptor.applies_to(&device.model) {
        tracing::debug!(
            descriptor = descriptor.name(),
            model = %device.model,
            "model gate rejected device"
        );
        return Resolution::NotApplicable;
    }

    let mut fields = serde_json::Map::new();
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    for (name, spec) in descriptor.fields() {
        match spec {
            FieldSpec::Literal(value) => {
                fields.insert(name.to_string(), value.clone());
            }
            FieldSpec::Cloud(cloud_spec) => {
                let value =
                    resolve_cloud_field(name, cloud_spec, cloud, device.scale_factor, &mut warnings);
                fields.insert(name.to_string(), value);
            }
            FieldSpec::DataPoint { code, required } => {
                if device.contains(code) {
                    fields.insert(name.to_string(), Value::String(code.as_str().to_string()));
                } else if *required {
                    errors.push(ResolutionError::MissingRequiredDataPoint {
                        field: name.to_string(),
                        code: code.clone(),
                    });
                }
                // An absent optional role is omitted, not stored as null.
            }
        }
    }

    let capability = ResolvedCapability {
        meta: descriptor.metadata(),
        fields,
        warnings,
    };

    if errors.is_empty() {
        Resolution::Resolved(capability)
    } else {
        Resolution::Failed {
            partial: capability,
            errors,
        }
    }
}

/// Resolve a device's full descriptor set, collecting an outcome per
/// descriptor. One descriptor failing never aborts its siblings: a device
/// with one misconfigured entity still exposes all the others.
pub fn resolve_all<'a>(
    descriptors: impl IntoIterator<Item = &'a CapabilityDescriptor>,
    device: &DeviceConfig,
    cloud: Option<&dyn CloudSource>,
) -> Vec<(&'a CapabilityDescriptor, Resolution)> {
    descriptors
        .into_iter()
        .map(|descriptor| (descriptor, resolve(descriptor, device, cloud)))
        .collect()
}

fn resolve_cloud_field(
    field: &str,
    spec: &CloudValueSpec,
    cloud: Option<&dyn CloudSource>,
    scale_factor: f64,
    warnings: &mut Vec<CoercionWarning>,
) -> Value {
    // Absent bundle, section, or key is the documented fallback path.
    let Some(raw) = cloud.and_then(|c| c.value(&spec.section, &spec.value_key)) else {
        return spec.default_value.clone();
    };

    let factor = if spec.scale { Some(scale_factor) } else { None };
    let coerced = match spec.coerce {
        None => Some(raw.clone()),
        Some(Coercion::Numeric(kind)) => coerce_numeric(raw, kind, factor),
        Some(Coercion::Labels(kind)) => {
            coerce_labels(raw, kind, &spec.remap_values, spec.reverse_dict)
        }
    };

    match coerced {
        Some(value) => value,
        None => {
            tracing::warn!(field, raw = %raw, "cloud value could not be coerced, using default");
            warnings.push(CoercionWarning {
                field: field.to_string(),
                raw: raw.clone(),
            });
            spec.default_value.clone()
        }
    }
}

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn parse_float(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Store an `f64` as an integer JSON number when it is integral, matching
/// the widening behavior of integer-times-scale arithmetic.
fn number_value(value: f64) -> Option<Value> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(Value::from(value as i64))
    } else {
        serde_json::Number::from_f64(value).map(Value::Number)
    }
}

fn coerce_numeric(raw: &Value, kind: NumericKind, factor: Option<f64>) -> Option<Value> {
    match kind {
        NumericKind::Integer => {
            let parsed = parse_integer(raw)?;
            match factor {
                None => Some(Value::from(parsed)),
                Some(factor) => number_value(parsed as f64 * factor),
            }
        }
        NumericKind::Float => {
            let parsed = parse_float(raw)?;
            let scaled = parsed * factor.unwrap_or(1.0);
            serde_json::Number::from_f64(scaled).map(Value::Number)
        }
        NumericKind::Text => {
            let parsed = parse_float(raw)?;
            let scaled = parsed * factor.unwrap_or(1.0);
            if scaled.fract() == 0.0 && scaled.abs() < i64::MAX as f64 {
                Some(Value::String(format!("{}", scaled as i64)))
            } else {
                Some(Value::String(scaled.to_string()))
            }
        }
    }
}

fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a raw cloud value as an ordered label list: a comma-delimited
/// string or a JSON array of scalars.
fn split_labels(raw: &Value) -> Option<Vec<String>> {
    match raw {
        Value::String(s) => Some(
            s.split(',')
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect(),
        ),
        Value::Array(items) => items.iter().map(label_of).collect(),
        _ => None,
    }
}

fn coerce_labels(
    raw: &Value,
    kind: LabelSetKind,
    remap: &BTreeMap<String, String>,
    reverse: bool,
) -> Option<Value> {
    let labels = split_labels(raw)?;

    match kind {
        LabelSetKind::List => Some(Value::Array(
            labels.into_iter().map(Value::String).collect(),
        )),
        LabelSetKind::Joined => Some(Value::String(labels.join(","))),
        LabelSetKind::Map => {
            let table: BTreeMap<String, String> = if reverse {
                remap.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
            } else {
                remap.clone()
            };

            let mut map = serde_json::Map::new();
            for label in labels {
                let mapped = table.get(&label).cloned().unwrap_or_else(|| label.clone());
                // First occurrence wins; order is first-seen.
                if !map.contains_key(&label) {
                    map.insert(label, Value::String(mapped));
                }
            }
            Some(Value::Object(map))
        }
    }
}
