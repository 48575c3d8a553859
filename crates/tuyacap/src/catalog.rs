//! The vendor data-point code catalog.
//!
//! A reference table mapping `DpCode` to a human label and an encoding
//! tag. It is data, not logic: the crate ships a starter asset
//! (`data/dp_codes.toml`) and callers can load and merge further files,
//! so new vendor codes need no rebuild. Unknown codes are treated as
//! opaque rather than rejected.

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::device::DpCode;
use crate::device::DpType;

const BUILTIN_CATALOG: &str = include_str!("../data/dp_codes.toml");

/// One catalog entry: the label the vendor documents for a code and how
/// its raw value is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub label: String,

    #[serde(rename = "type")]
    pub dp_type: DpType,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Exact-match lookup table of vendor data point codes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DpCatalog {
    entries: BTreeMap<DpCode, CatalogEntry>,
}

impl DpCatalog {
    /// The catalog bundled with the crate, covering the common vendor
    /// codes.
    pub fn builtin() -> Self {
        Self::from_toml(BUILTIN_CATALOG).expect("bundled catalog is valid TOML")
    }

    /// Parse a catalog from TOML text: one table per code, with `label`
    /// and `type` keys.
    pub fn from_toml(text: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a catalog file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CatalogError::Io(path.as_ref().to_path_buf(), e))?;
        Self::from_toml(&contents)
    }

    /// Merge another catalog into this one. Entries in `other` win, so
    /// site-local files can extend or correct the builtin table.
    pub fn merge(&mut self, other: DpCatalog) {
        self.entries.extend(other.entries);
    }

    /// Exact-match lookup. `None` means the code is unknown here; it is
    /// still usable opaquely everywhere else in the crate.
    pub fn entry(&self, code: &DpCode) -> Option<&CatalogEntry> {
        self.entries.get(code)
    }

    pub fn dp_type(&self, code: &DpCode) -> Option<DpType> {
        self.entries.get(code).map(|entry| entry.dp_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DpCode, &CatalogEntry)> {
        self.entries.iter()
    }
}
