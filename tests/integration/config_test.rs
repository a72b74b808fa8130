// Integration tests for configuration loading and validation

use checksignal::config::{Config, LogFormat};
use checksignal::errors::ErrorCode;
use checksignal::state::Voltage;
use checksignal::util::config::{load, Overrides};
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_toml_config_loading() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"
[tuner]
device = 2
lnb = "low"

[monitor]
interval_ms = 2000
bell = true
json = true

[logging]
level = "debug"
format = "json"

[metrics]
textfile = "/var/lib/node_exporter/checksignal.prom"
    "#).unwrap();

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.tuner.device, Some(2));
    assert_eq!(config.tuner.lnb, Some(Voltage::Low));
    assert_eq!(config.monitor.interval_ms, 2000);
    assert!(config.monitor.bell);
    assert!(config.monitor.json);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(
        config.metrics.textfile.as_deref(),
        Some(std::path::Path::new("/var/lib/node_exporter/checksignal.prom"))
    );
}

#[test]
fn test_env_var_overrides() {
    env::set_var("CHECKSIGNAL_DEVICE", "4");
    env::set_var("CHECKSIGNAL_LNB", "15");
    env::set_var("CHECKSIGNAL_INTERVAL_MS", "750");

    let mut config = Config::default();
    config.apply_env_vars();

    assert_eq!(config.tuner.device, Some(4));
    assert_eq!(config.tuner.lnb, Some(Voltage::High));
    assert_eq!(config.monitor.interval_ms, 750);

    env::remove_var("CHECKSIGNAL_DEVICE");
    env::remove_var("CHECKSIGNAL_LNB");
    env::remove_var("CHECKSIGNAL_INTERVAL_MS");
}

#[test]
fn test_cli_overrides_beat_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"
[monitor]
interval_ms = 2000
    "#).unwrap();

    let path = file.path().to_path_buf();
    let overrides = Overrides {
        interval_ms: Some(100),
        log_level: Some("warn".to_string()),
        ..Default::default()
    };
    let config = load(Some(&path), &overrides).unwrap();

    assert_eq!(config.monitor.interval_ms, 100);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_invalid_toml_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "this is not [valid toml").unwrap();

    let result = Config::from_file(file.path());
    assert!(result.is_err());
}

#[test]
fn test_zero_interval_in_file_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"
[monitor]
interval_ms = 0
    "#).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_file_values_rescued_by_cli() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"
[monitor]
interval_ms = 0

[logging]
level = "loud"
    "#).unwrap();

    let path = file.path().to_path_buf();
    let overrides = Overrides {
        interval_ms: Some(500),
        log_level: Some("warn".to_string()),
        ..Default::default()
    };
    let config = load(Some(&path), &overrides).unwrap();

    assert_eq!(config.monitor.interval_ms, 500);
    assert_eq!(config.logging.level, "warn");
}

#[test]
fn test_unrescued_file_value_still_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, r#"
[logging]
level = "loud"
    "#).unwrap();

    let path = file.path().to_path_buf();
    let err = load(Some(&path), &Overrides::default()).unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidLogLevel);
}

#[test]
fn test_lnb_in_file_uses_volts() {
    for (value, expected) in [("11", Voltage::Low), ("15", Voltage::High), ("12", Voltage::Off), ("\"garbage\"", Voltage::Off)] {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[tuner]\nlnb = {}", value).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.tuner.lnb, Some(expected), "lnb = {}", value);
    }
}

#[test]
fn test_missing_config_file() {
    let result = Config::from_file("/nonexistent/checksignal.toml");
    assert!(result.is_err());
}
