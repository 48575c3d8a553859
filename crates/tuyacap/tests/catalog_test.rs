//! Catalog loading and extension through the public API.

use std::io::Write;

use tuyacap::DpCatalog;
use tuyacap::DpCode;
use tuyacap::DpType;

#[test]
fn load_catalog_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[garden_valve]
label = "Garden valve"
type = "Boolean"

[flow_rate]
label = "Flow rate"
type = "Integer"
"#
    )
    .unwrap();

    let catalog = DpCatalog::from_path(file.path()).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(
        catalog.dp_type(&DpCode::from("garden_valve")),
        Some(DpType::Boolean)
    );
}

#[test]
fn missing_file_reports_path() {
    let err = DpCatalog::from_path("/nonexistent/dp_codes.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/dp_codes.toml"));
}

#[test]
fn site_local_file_extends_builtin() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[vendor_custom_dp]
label = "Vendor custom"
type = "String"
"#
    )
    .unwrap();

    let mut catalog = DpCatalog::builtin();
    let builtin_len = catalog.len();
    catalog.merge(DpCatalog::from_path(file.path()).unwrap());

    assert_eq!(catalog.len(), builtin_len + 1);
    // Builtin entries survive the merge.
    assert_eq!(
        catalog.dp_type(&DpCode::from("bright_value")),
        Some(DpType::Integer)
    );
    assert_eq!(
        catalog.entry(&DpCode::from("vendor_custom_dp")).unwrap().label,
        "Vendor custom"
    );
}
