//! Configuration loading and validation

use adaptive_signal_sim::simulation::{
    Direction, SimConfig, SimParams, VehicleClass, MIN_SPAWN_INTERVAL_SECS,
};

#[test]
fn test_default_config_is_valid() {
    let params = SimConfig::default()
        .into_params()
        .expect("default config should validate");
    assert_eq!(params, SimParams::default());
    assert_eq!(params.duration_secs, 300);
    assert_eq!(params.signal.min_green, 10);
    assert_eq!(params.signal.max_green, 60);
    assert_eq!(params.class(VehicleClass::Bus).clearance_secs, 2.5);
    assert_eq!(params.approach(Direction::Left).stop_line, 800.0);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = SimConfig::from_json_str(r#"{ "duration_secs": 30, "turn_probability": 0.5 }"#)
        .expect("partial config should parse");
    let params = config.into_params().expect("partial config should validate");
    assert_eq!(params.duration_secs, 30);
    assert_eq!(params.turn_probability, 0.5);
    assert_eq!(params.spawn_interval_secs, 0.85);
    assert_eq!(params.class(VehicleClass::Car).speed, 1.15);
}

#[test]
fn test_missing_class_is_rejected() {
    let mut config = SimConfig::default();
    config.classes.remove(&VehicleClass::Rickshaw);
    let err = config.into_params().expect_err("missing class should fail");
    assert!(err.to_string().contains("rickshaw"), "unexpected error: {}", err);

    // A JSON classes table replaces the defaults wholesale
    let config = SimConfig::from_json_str(
        r#"{ "classes": { "car": { "speed": 1.0, "clearance_secs": 2.0, "length": 40.0, "width": 20.0 } } }"#,
    )
    .expect("classes table should parse");
    assert!(config.into_params().is_err());
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut config = SimConfig::default();
    config.signal.min_green = 70;
    assert!(config.into_params().is_err());

    let mut config = SimConfig::default();
    config.signal.min_green = 0;
    assert!(config.into_params().is_err());

    let mut config = SimConfig::default();
    config.turn_probability = 1.5;
    assert!(config.into_params().is_err());

    let mut config = SimConfig::default();
    config.spawn_interval_secs = 0.0;
    assert!(config.into_params().is_err());

    let mut config = SimConfig::default();
    if let Some(profile) = config.classes.get_mut(&VehicleClass::Truck) {
        profile.speed = -1.0;
    }
    assert!(config.into_params().is_err());
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(SimConfig::from_json_str("{ not json").is_err());
    assert!(SimConfig::from_json_str(r#"{ "duration_secs": "long" }"#).is_err());
}

#[test]
fn test_out_of_range_counts_are_rejected() {
    let config = SimConfig::from_json_str(r#"{ "detection_lane_count": 4294967295 }"#)
        .expect("lane count should parse");
    let err = config.into_params().expect_err("huge lane count should fail");
    assert!(err.to_string().contains("detection_lane_count"), "unexpected error: {}", err);

    let mut config = SimConfig::default();
    config.detection_lane_count = 3;
    assert!(config.into_params().is_ok());
}

#[test]
fn test_tiny_spawn_interval_is_rejected() {
    let mut config = SimConfig::default();
    config.spawn_interval_secs = 1e-30;
    let err = config.into_params().expect_err("tiny spawn interval should fail");
    assert!(err.to_string().contains("spawn_interval_secs"), "unexpected error: {}", err);

    let mut config = SimConfig::default();
    config.spawn_interval_secs = MIN_SPAWN_INTERVAL_SECS;
    assert!(config.into_params().is_ok());
}
