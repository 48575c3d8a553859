//! Declarative device-capability resolution for Tuya-protocol devices.
//!
//! Maps a device's raw data-point configuration (plus an optional bundle of
//! vendor-cloud metadata) onto typed capability records a host entity
//! framework can act on. The crate owns no I/O and no protocol code: the
//! pairing layer supplies [`DeviceConfig`] snapshots, the cloud client
//! supplies [`CloudDataBundle`]s, and [`resolve`] turns a static
//! [`CapabilityDescriptor`] plus those inputs into a [`ResolvedCapability`].

pub mod catalog;
pub mod cloud;
pub mod descriptor;
pub mod device;
pub mod resolver;

pub use catalog::CatalogEntry;
pub use catalog::CatalogError;
pub use catalog::DpCatalog;
pub use cloud::CloudDataBundle;
pub use cloud::CloudSource;
pub use cloud::CloudValueSpec;
pub use cloud::Coercion;
pub use cloud::LabelSetKind;
pub use cloud::NumericKind;
pub use descriptor::CapabilityDescriptor;
pub use descriptor::DescriptorBuilder;
pub use descriptor::DescriptorError;
pub use descriptor::EntityCategory;
pub use descriptor::EntityMetadata;
pub use descriptor::FieldSpec;
pub use descriptor::Platform;
pub use device::DataPoint;
pub use device::DeviceConfig;
pub use device::DpCode;
pub use device::DpType;
pub use resolver::resolve;
pub use resolver::resolve_all;
pub use resolver::CoercionWarning;
pub use resolver::ResolvedCapability;
pub use resolver::Resolution;
pub use resolver::ResolutionError;
