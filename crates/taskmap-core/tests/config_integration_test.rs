//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::time::Duration;
use taskmap_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use tempfile::{NamedTempFile, TempDir};

fn clear_env() {
    env::remove_var("TASKMAP_MAX_ZOOM");
    env::remove_var("TASKMAP_UNCLUSTER_THRESHOLD");
    env::remove_var("TASKMAP_MAX_ALLOWED_DEGREES");
    env::remove_var("TASKMAP_SEARCH_DEBOUNCE_MS");
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.max_zoom.value, 18);
    assert_eq!(config.max_zoom.source, ConfigSource::Default);
    assert_eq!(config.uncluster_threshold.value, 1000);
    assert_eq!(config.uncluster_threshold.source, ConfigSource::Default);
    assert_eq!(config.max_allowed_degrees.value, 70.0);
    assert_eq!(config.search_debounce_ms.value, 400);
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
uncluster_threshold = 500
# Only override the threshold, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.uncluster_threshold.value, 500);
    assert_eq!(config.uncluster_threshold.source, ConfigSource::File);
    assert_eq!(config.max_zoom.value, 18);
    assert_eq!(config.max_zoom.source, ConfigSource::Default);
    assert_eq!(config.search_debounce_ms.source, ConfigSource::Default);
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();

    env::set_var("TASKMAP_MAX_ZOOM", "15");
    env::set_var("TASKMAP_MAX_ALLOWED_DEGREES", "30");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
max_zoom = 16
max_allowed_degrees = 45.0
uncluster_threshold = 200
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.max_zoom.value, 15);
    assert_eq!(config.max_zoom.source, ConfigSource::Environment);
    assert_eq!(config.max_allowed_degrees.value, 30.0);
    assert_eq!(config.max_allowed_degrees.source, ConfigSource::Environment);
    assert_eq!(config.uncluster_threshold.value, 200);
    assert_eq!(config.uncluster_threshold.source, ConfigSource::File);

    clear_env();
}

#[test]
#[serial]
fn test_malformed_environment_value_is_ignored() {
    clear_env();
    env::set_var("TASKMAP_UNCLUSTER_THRESHOLD", "lots");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.uncluster_threshold.value, 1000);
    assert_eq!(config.uncluster_threshold.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("TASKMAP_SEARCH_DEBOUNCE_MS", "250");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "search_debounce_ms = 600").unwrap();

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.search_debounce_ms.value, 250);
    assert_eq!(config.search_debounce_ms.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        search_debounce_ms: Some(100),
        ..Default::default()
    });

    assert_eq!(config.search_debounce_ms.value, 100);
    assert_eq!(config.search_debounce_ms.source, ConfigSource::Cli);
    assert_eq!(config.coordinator_config().search_debounce, Duration::from_millis(100));

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}

#[test]
fn test_configuration_source_tracking() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "max_zoom = 17\nmax_allowed_degrees = 20.5").unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    let inspection_map = config.to_inspection_map();

    let (zoom_value, zoom_source) = &inspection_map["max_zoom"];
    assert_eq!(zoom_value, "17");
    assert_eq!(*zoom_source, ConfigSource::File);

    let (degrees_value, degrees_source) = &inspection_map["max_allowed_degrees"];
    assert_eq!(degrees_value, "20.5°");
    assert_eq!(*degrees_source, ConfigSource::File);

    let (threshold_value, threshold_source) = &inspection_map["uncluster_threshold"];
    assert_eq!(threshold_value, "1000");
    assert_eq!(*threshold_source, ConfigSource::Default);
}

#[test]
fn test_invalid_toml_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "invalid toml content [[[").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());

    assert!(result.is_err());
}

#[test]
fn test_wrongly_typed_value_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "max_zoom = \"eighteen\"").unwrap();

    let result = LayeredConfig::with_defaults().load_from_file(file.path());

    assert!(result.is_err());
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let non_existent = temp_dir.path().join("does_not_exist.toml");

    let result = LayeredConfig::with_defaults().load_from_file(&non_existent);

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("taskmap.toml");
    fs::write(
        &config_path,
        r#"
max_zoom = 16
uncluster_threshold = 300
max_allowed_degrees = 50.0
"#,
    )
    .unwrap();

    env::set_var("TASKMAP_UNCLUSTER_THRESHOLD", "750");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.max_zoom.value, 16);
    assert_eq!(config.uncluster_threshold.value, 750);
    assert_eq!(config.uncluster_threshold.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        max_allowed_degrees: Some(10.0),
        ..Default::default()
    });

    assert!(config.validate().is_ok());

    let coordinator = config.coordinator_config();
    assert_eq!(coordinator.max_zoom, 16);
    assert_eq!(coordinator.uncluster_threshold, 750);
    assert_eq!(coordinator.max_allowed_degrees, 10.0);
    assert_eq!(coordinator.search_debounce, Duration::from_millis(400));

    clear_env();
}
