//! Cloud-reported metadata and the declarative fallback rules that read it.
//!
//! The cloud bundle is an optional, differently-shaped auxiliary data source:
//! named sections of key/value entries reported by the vendor's cloud API.
//! Descriptors use [`CloudValueSpec`] rules to derive default values from it
//! when the device configuration does not supply one.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Source of cloud-reported metadata for one device.
///
/// The canonical implementation is [`CloudDataBundle`]; tests substitute
/// their own to observe (or forbid) lookups.
pub trait CloudSource {
    /// Look up `key` inside the named section. `None` for an absent
    /// section or key.
    fn value(&self, section: &str, key: &str) -> Option<&Value>;
}

/// Per-device metadata reported by the vendor cloud, organized as named
/// sections each containing key/value entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudDataBundle {
    #[serde(flatten)]
    sections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl CloudDataBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub fn with(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.insert(section, key, value);
        self
    }
}

impl CloudSource for CloudDataBundle {
    fn value(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section)?.get(key)
    }
}

/// Numeric representation a cloud value is coerced into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericKind {
    Integer,
    Float,
    /// The number rendered back as a string.
    Text,
}

/// Shape a label-set cloud value is coerced into. The raw value is parsed
/// as a comma-delimited list of labels (or a JSON array).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabelSetKind {
    /// Ordered array of the labels themselves.
    List,
    /// Mapping from each label to its remapped value, first-seen order.
    Map,
    /// The labels re-joined with commas.
    Joined,
}

/// Target coercion for a cloud value, decided at descriptor-construction
/// time. One closed tag per coercion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coercion {
    Numeric(NumericKind),
    Labels(LabelSetKind),
}

/// Declarative rule deriving a field's value from the cloud bundle.
///
/// Lookup order: the named section, then `value_key` inside it. An absent
/// bundle, section, or key falls back to `default_value` (not an error).
/// A found value is coerced per `coerce`; a value that cannot be coerced
/// also falls back to `default_value`, surfaced only as a warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudValueSpec {
    /// Used whenever lookup or coercion fails.
    pub default_value: Value,

    /// Name of the cloud section to search (e.g. `"functions"`, `"status"`).
    pub section: String,

    /// Key of the targeted value inside that section.
    pub value_key: String,

    /// Target coercion; `None` stores the found value verbatim.
    pub coerce: Option<Coercion>,

    /// Remap table for `Labels(Map)` coercion: old label -> new value.
    pub remap_values: BTreeMap<String, String>,

    /// Swap the remap table's key/value direction before use.
    pub reverse_dict: bool,

    /// Multiply a numeric result by the device's declared scale factor.
    pub scale: bool,
}

impl CloudValueSpec {
    pub fn new(
        default_value: impl Into<Value>,
        section: impl Into<String>,
        value_key: impl Into<String>,
    ) -> Self {
        Self {
            default_value: default_value.into(),
            section: section.into(),
            value_key: value_key.into(),
            coerce: None,
            remap_values: BTreeMap::new(),
            reverse_dict: false,
            scale: false,
        }
    }

    pub fn coerce(mut self, coerce: Coercion) -> Self {
        self.coerce = Some(coerce);
        self
    }

    pub fn remap<K, V>(mut self, table: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.remap_values = table
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse_dict = true;
        self
    }

    pub fn scaled(mut self) -> Self {
        self.scale = true;
        self
    }

    /// Check the flag/coercion combinations that are only meaningful
    /// together. Called once, when the owning descriptor is built.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.reverse_dict && self.remap_values.is_empty() {
            return Err("reverse_dict set without a remap table".to_string());
        }
        if !self.remap_values.is_empty()
            && !matches!(self.coerce, Some(Coercion::Labels(_)))
        {
            return Err("remap table requires a label-set coercion".to_string());
        }
        if self.scale && !matches!(self.coerce, Some(Coercion::Numeric(_))) {
            return Err("scale requires a numeric coercion".to_string());
        }
        Ok(())
    }
}
