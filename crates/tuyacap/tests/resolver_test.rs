//! End-to-end resolution behavior over the public API.

use serde_json::json;
use serde_json::Value;

use tuyacap::CapabilityDescriptor;
use tuyacap::CloudDataBundle;
use tuyacap::CloudSource;
use tuyacap::CloudValueSpec;
use tuyacap::Coercion;
use tuyacap::DataPoint;
use tuyacap::DeviceConfig;
use tuyacap::DpCode;
use tuyacap::DpType;
use tuyacap::LabelSetKind;
use tuyacap::NumericKind;
use tuyacap::Platform;
use tuyacap::Resolution;
use tuyacap::ResolutionError;
use tuyacap::{resolve, resolve_all};

/// Cloud stub that fails the test if anything queries it.
struct PanickingCloud;

impl CloudSource for PanickingCloud {
    fn value(&self, section: &str, key: &str) -> Option<&Value> {
        panic!("cloud bundle unexpectedly queried for {section}.{key}");
    }
}

fn dimmer_device() -> DeviceConfig {
    DeviceConfig::new("abc_cjkg_v2")
        .with_scale_factor(2.0)
        .with_dp("switch_led", DataPoint::new(true, DpType::Boolean))
        .with_dp("bright_value", DataPoint::new(128, DpType::Integer))
}

fn light_descriptor() -> CapabilityDescriptor {
    CapabilityDescriptor::builder(Platform::Light, "Garden Light")
        .icon("mdi:lightbulb")
        .primary("switch_led")
        .cloud(
            "brightness",
            CloudValueSpec::new(255, "functions", "bright_value")
                .coerce(Coercion::Numeric(NumericKind::Integer))
                .scaled(),
        )
        .literal("color_mode", "hsv")
        .finish()
        .unwrap()
}

#[test]
fn cloudless_descriptor_never_touches_cloud_data() {
    let descriptor = CapabilityDescriptor::builder(Platform::Switch, "Switch")
        .icon("mdi:power")
        .primary("switch_led")
        .literal("restore_on_reconnect", true)
        .finish()
        .unwrap();

    // Would panic on any lookup.
    let outcome = resolve(&descriptor, &dimmer_device(), Some(&PanickingCloud));
    let capability = outcome.capability().unwrap();
    assert_eq!(capability.fields["id"], json!("switch_led"));
    assert_eq!(capability.fields["restore_on_reconnect"], json!(true));
}

#[test]
fn gated_descriptor_skips_without_querying_cloud() {
    let descriptor = CapabilityDescriptor::builder(Platform::Switch, "Scene Switch")
        .primary("switch_led")
        .cloud(
            "modes",
            CloudValueSpec::new("auto", "status", "work_mode")
                .coerce(Coercion::Labels(LabelSetKind::List)),
        )
        .only_for_models(["cjkg"])
        .finish()
        .unwrap();

    // Gate matches: resolution proceeds (cloud absent, default applies).
    let matching = resolve(&descriptor, &dimmer_device(), None);
    assert!(matching.is_resolved());

    // Gate rejects: NotApplicable, and the panicking stub proves no
    // lookup happened.
    let other_device = DeviceConfig::new("abc_xyz");
    let rejected = resolve(&descriptor, &other_device, Some(&PanickingCloud));
    assert_eq!(rejected, Resolution::NotApplicable);
}

#[test]
fn absent_section_yields_default_for_every_coercion() {
    let cloud = CloudDataBundle::new().with("unrelated", "key", "value");

    let cases = [
        (
            CloudValueSpec::new(255, "functions", "bright_value")
                .coerce(Coercion::Numeric(NumericKind::Integer)),
            json!(255),
        ),
        (
            CloudValueSpec::new(0.5, "functions", "bright_value")
                .coerce(Coercion::Numeric(NumericKind::Float)),
            json!(0.5),
        ),
        (
            CloudValueSpec::new("auto", "functions", "modes")
                .coerce(Coercion::Labels(LabelSetKind::Map)),
            json!("auto"),
        ),
        (CloudValueSpec::new("verbatim", "functions", "modes"), json!("verbatim")),
    ];

    for (spec, expected) in cases {
        let descriptor = CapabilityDescriptor::builder(Platform::Sensor, "Sensor")
            .cloud("field", spec)
            .finish()
            .unwrap();
        let outcome = resolve(&descriptor, &DeviceConfig::new("any"), Some(&cloud));
        let capability = outcome.capability().unwrap();
        assert_eq!(capability.fields["field"], expected);
    }
}

#[test]
fn resolution_is_idempotent() {
    let descriptor = light_descriptor();
    let device = dimmer_device();
    let cloud = CloudDataBundle::new().with("functions", "bright_value", "128");

    let first = resolve(&descriptor, &device, Some(&cloud));
    let second = resolve(&descriptor, &device, Some(&cloud));
    assert_eq!(first, second);
}

#[test]
fn scaled_brightness_scenario() {
    // default 255, cloud reports "128", integer coercion, device factor 2.
    let cloud = CloudDataBundle::new().with("functions", "bright_value", "128");
    let outcome = resolve(&light_descriptor(), &dimmer_device(), Some(&cloud));
    let capability = outcome.capability().unwrap();
    assert_eq!(capability.fields["brightness"], json!(256));
}

#[test]
fn work_mode_remap_scenario() {
    let descriptor = CapabilityDescriptor::builder(Platform::Select, "Mode")
        .cloud(
            "mode",
            CloudValueSpec::new("auto", "status", "work_mode")
                .coerce(Coercion::Labels(LabelSetKind::Map))
                .remap([("0", "eco"), ("1", "boost")]),
        )
        .finish()
        .unwrap();

    let cloud = CloudDataBundle::new().with("status", "work_mode", "0,1");
    let outcome = resolve(&descriptor, &DeviceConfig::new("heater"), Some(&cloud));
    let capability = outcome.capability().unwrap();

    // Each parsed label maps to its remapped value, first-seen order.
    let mode = capability.fields["mode"].as_object().unwrap();
    let entries: Vec<(&str, &Value)> = mode.iter().map(|(k, v)| (k.as_str(), v)).collect();
    assert_eq!(
        entries,
        vec![("0", &json!("eco")), ("1", &json!("boost"))]
    );
}

#[test]
fn reverse_dict_matches_prereversed_table() {
    let cloud = CloudDataBundle::new().with("status", "work_mode", "eco,boost");

    let reversed = CapabilityDescriptor::builder(Platform::Select, "Mode")
        .cloud(
            "mode",
            CloudValueSpec::new("auto", "status", "work_mode")
                .coerce(Coercion::Labels(LabelSetKind::Map))
                .remap([("0", "eco"), ("1", "boost")])
                .reversed(),
        )
        .finish()
        .unwrap();

    let prereversed = CapabilityDescriptor::builder(Platform::Select, "Mode")
        .cloud(
            "mode",
            CloudValueSpec::new("auto", "status", "work_mode")
                .coerce(Coercion::Labels(LabelSetKind::Map))
                .remap([("eco", "0"), ("boost", "1")]),
        )
        .finish()
        .unwrap();

    let device = DeviceConfig::new("heater");
    assert_eq!(
        resolve(&reversed, &device, Some(&cloud)),
        resolve(&prereversed, &device, Some(&cloud))
    );
}

#[test]
fn missing_required_dp_reported_with_siblings() {
    let descriptor = CapabilityDescriptor::builder(Platform::Switch, "Switch")
        .data_point("switch_dp", "switch_1")
        .literal("restore_on_reconnect", true)
        .finish()
        .unwrap();

    let device = DeviceConfig::new("plug"); // exposes no data points
    match resolve(&descriptor, &device, None) {
        Resolution::Failed { partial, errors } => {
            assert_eq!(
                errors,
                vec![ResolutionError::MissingRequiredDataPoint {
                    field: "switch_dp".to_string(),
                    code: DpCode::from("switch_1"),
                }]
            );
            // Sibling still resolved alongside the error marker.
            assert_eq!(partial.fields["restore_on_reconnect"], json!(true));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[test]
fn batch_resolution_collects_every_outcome() {
    let descriptors = vec![
        light_descriptor(),
        CapabilityDescriptor::builder(Platform::Switch, "Scene Switch")
            .primary("relay_status_1")
            .only_for_models(["wxkg"])
            .finish()
            .unwrap(),
        CapabilityDescriptor::builder(Platform::Cover, "Cover")
            .primary("percent_control")
            .finish()
            .unwrap(),
    ];

    let cloud = CloudDataBundle::new().with("functions", "bright_value", "128");
    let outcomes = resolve_all(&descriptors, &dimmer_device(), Some(&cloud));

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].1.is_resolved());
    assert!(outcomes[1].1.is_not_applicable());
    assert!(matches!(outcomes[2].1, Resolution::Failed { .. }));
}

#[test]
fn resolved_record_shape() {
    let cloud = CloudDataBundle::new().with("functions", "bright_value", "128");
    let outcome = resolve(&light_descriptor(), &dimmer_device(), Some(&cloud));
    let json = serde_json::to_string_pretty(outcome.capability().unwrap()).unwrap();

    insta::assert_snapshot!(json, @r#"
    {
      "meta": {
        "friendly_name": "Garden Light",
        "icon": "mdi:lightbulb",
        "entity_category": "none"
      },
      "fields": {
        "id": "switch_led",
        "brightness": 256,
        "color_mode": "hsv"
      }
    }
    "#);
}

#[test]
fn inputs_are_not_mutated() {
    let descriptor = light_descriptor();
    let device = dimmer_device();
    let cloud = CloudDataBundle::new().with("functions", "bright_value", "128");

    let descriptor_before = descriptor.clone();
    let device_model_before = device.model.clone();
    let cloud_before = cloud.clone();

    let _ = resolve(&descriptor, &device, Some(&cloud));

    assert_eq!(descriptor, descriptor_before);
    assert_eq!(device.model, device_model_before);
    assert_eq!(cloud, cloud_before);
}
