//! Static capability descriptors: one per entity kind per platform,
//! constructed at integration-definition time and immutable thereafter.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use strum::Display;

use crate::cloud::CloudValueSpec;
use crate::device::DpCode;

/// Host platform an entity kind targets, matching Home Assistant's
/// platform names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Platform {
    BinarySensor,
    Climate,
    Cover,
    Fan,
    Humidifier,
    Light,
    Lock,
    Number,
    Select,
    Sensor,
    Siren,
    Switch,
    Vacuum,
    WaterHeater,
}

/// Entity category, matching the host framework's fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityCategory {
    #[default]
    None,
    Config,
    Diagnostic,
}

/// Fixed metadata sub-record handed to the host entity framework.
///
/// `device_class` and `state_class` are omitted entirely when unset;
/// callers must treat "absent" and "empty string" as distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub friendly_name: String,
    pub icon: String,
    pub entity_category: EntityCategory,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<String>,
}

/// How one descriptor field obtains its value. Decided at construction
/// time, so the resolver dispatches on a closed tag instead of inspecting
/// value types at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Literal default, copied verbatim into the result.
    Literal(Value),

    /// Derived from the cloud bundle with a default fallback.
    Cloud(CloudValueSpec),

    /// Names the data point filling this semantic role. Resolves to the
    /// code itself; a required role must exist on the device.
    DataPoint { code: DpCode, required: bool },
}

/// Declarative, per-entity-kind specification of how device data points
/// map to host-visible capability fields.
///
/// Built once per platform through [`CapabilityDescriptor::builder`],
/// validated by [`DescriptorBuilder::finish`], and never mutated
/// per-device afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDescriptor {
    platform: Platform,
    name: String,
    icon: String,
    entity_category: EntityCategory,
    device_class: Option<String>,
    state_class: Option<String>,
    fields: Vec<(String, FieldSpec)>,
    contains_any: Vec<String>,
}

impl CapabilityDescriptor {
    pub fn builder(platform: Platform, name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder {
            platform,
            name: name.into(),
            icon: String::new(),
            entity_category: EntityCategory::None,
            device_class: None,
            state_class: None,
            fields: Vec::new(),
            contains_any: Vec::new(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this descriptor applies to a device with the given model
    /// string. An empty gate applies to every device; otherwise at least
    /// one listed substring must occur (exact, case-sensitive).
    pub fn applies_to(&self, model: &str) -> bool {
        self.contains_any.is_empty() || self.contains_any.iter().any(|s| model.contains(s))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Build the fixed metadata sub-record for the host framework.
    pub fn metadata(&self) -> EntityMetadata {
        EntityMetadata {
            friendly_name: self.name.clone(),
            icon: self.icon.clone(),
            entity_category: self.entity_category,
            device_class: self.device_class.clone(),
            state_class: self.state_class.clone(),
        }
    }
}

/// Problems detected while building a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("field name {0:?} is not a valid identifier")]
    InvalidFieldName(String),

    #[error("duplicate field {0:?}")]
    DuplicateField(String),

    #[error("field {field:?}: {message}")]
    InvalidCloudSpec { field: String, message: String },
}

/// Validating builder for [`CapabilityDescriptor`]. Each builder owns a
/// freshly constructed field list; nothing is shared between descriptors.
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    platform: Platform,
    name: String,
    icon: String,
    entity_category: EntityCategory,
    device_class: Option<String>,
    state_class: Option<String>,
    fields: Vec<(String, FieldSpec)>,
    contains_any: Vec<String>,
}

impl DescriptorBuilder {
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn entity_category(mut self, category: EntityCategory) -> Self {
        self.entity_category = category;
        self
    }

    pub fn device_class(mut self, device_class: impl Into<String>) -> Self {
        self.device_class = Some(device_class.into());
        self
    }

    pub fn state_class(mut self, state_class: impl Into<String>) -> Self {
        self.state_class = Some(state_class.into());
        self
    }

    /// Literal field default.
    pub fn literal(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields
            .push((field.into(), FieldSpec::Literal(value.into())));
        self
    }

    /// Cloud-derived field.
    pub fn cloud(mut self, field: impl Into<String>, spec: CloudValueSpec) -> Self {
        self.fields.push((field.into(), FieldSpec::Cloud(spec)));
        self
    }

    /// Required data point role: the device must expose `code`.
    pub fn data_point(mut self, field: impl Into<String>, code: impl Into<DpCode>) -> Self {
        self.fields.push((
            field.into(),
            FieldSpec::DataPoint {
                code: code.into(),
                required: true,
            },
        ));
        self
    }

    /// Optional data point role: omitted from the result when absent.
    pub fn optional_data_point(
        mut self,
        field: impl Into<String>,
        code: impl Into<DpCode>,
    ) -> Self {
        self.fields.push((
            field.into(),
            FieldSpec::DataPoint {
                code: code.into(),
                required: false,
            },
        ));
        self
    }

    /// The entity's primary data point, stored under the conventional
    /// `id` field.
    pub fn primary(self, code: impl Into<DpCode>) -> Self {
        self.data_point("id", code)
    }

    /// Gate the descriptor to devices whose model string contains at
    /// least one of the given substrings.
    pub fn only_for_models<S: Into<String>>(
        mut self,
        substrings: impl IntoIterator<Item = S>,
    ) -> Self {
        self.contains_any = substrings.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and freeze the descriptor.
    pub fn finish(self) -> Result<CapabilityDescriptor, DescriptorError> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.fields.len());
        for (name, spec) in &self.fields {
            if !is_identifier(name) {
                return Err(DescriptorError::InvalidFieldName(name.clone()));
            }
            if seen.contains(&name.as_str()) {
                return Err(DescriptorError::DuplicateField(name.clone()));
            }
            seen.push(name);

            if let FieldSpec::Cloud(cloud) = spec {
                cloud
                    .validate()
                    .map_err(|message| DescriptorError::InvalidCloudSpec {
                        field: name.clone(),
                        message,
                    })?;
            }
        }

        Ok(CapabilityDescriptor {
            platform: self.platform,
            name: self.name,
            icon: self.icon,
            entity_category: self.entity_category,
            device_class: self.device_class,
            state_class: self.state_class,
            fields: self.fields,
            contains_any: self.contains_any,
        })
    }
}

/// Field names are ASCII identifiers: a letter or underscore followed by
/// letters, digits, or underscores.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
