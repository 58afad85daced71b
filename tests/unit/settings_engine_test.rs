//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, value persistence, and reset behavior.

use std::time::Duration;

use sitedeck::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use sitedeck::types::errors::SettingsError;
use sitedeck::types::settings::{ShellSettings, WatchdogSettings};
use tempfile::TempDir;

/// Helper: create a SettingsEngine backed by a temp directory that lives for the
/// duration of the test (the caller holds the `TempDir` handle).
fn engine_in_temp(dir: &TempDir) -> SettingsEngine {
    let path = dir
        .path()
        .join("settings.json")
        .to_string_lossy()
        .to_string();
    SettingsEngine::new(Some(path))
}

/// Without a config file the shell starts with the built-in timings.
#[test]
fn test_load_defaults_when_no_config_file_exists() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let settings = engine.load().unwrap();

    assert_eq!(settings, ShellSettings::default());
    assert_eq!(settings.watchdog.pre_start_timeout_secs, 10);
    assert_eq!(settings.watchdog.stuck_timeout_secs, 20);
    assert_eq!(settings.watchdog.diagnostic_stuck_timeout_secs, 5);
    assert!(!settings.watchdog.diagnostic_mode);
    assert_eq!(settings.watchdog.crash_recovery_timeout_secs, 8);
    assert_eq!(settings.tabs.icon_refresh_interval_secs, 300);
    assert!(settings.tabs.extra_headers.is_empty());
}

#[test]
fn test_set_value_persists_changes() {
    let dir = TempDir::new().unwrap();

    {
        let mut engine = engine_in_temp(&dir);
        engine.load().unwrap();
        engine
            .set_value("watchdog.stuck_timeout_secs", serde_json::json!(45))
            .unwrap();
    }

    let mut engine = engine_in_temp(&dir);
    let settings = engine.load().unwrap();
    assert_eq!(settings.watchdog.stuck_timeout_secs, 45);
    assert_eq!(settings.watchdog.stuck_timeout(), Duration::from_secs(45));
}

#[test]
fn test_set_value_adds_extra_header() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine.load().unwrap();

    engine
        .set_value(
            "tabs.extra_headers.Accept-Language",
            serde_json::json!("en-US"),
        )
        .unwrap();

    let mut reloaded = engine_in_temp(&dir);
    let settings = reloaded.load().unwrap();
    assert_eq!(
        settings.tabs.header_pairs(),
        vec![("Accept-Language".to_string(), "en-US".to_string())]
    );
}

#[test]
fn test_set_value_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let err = engine
        .set_value("tabs.nonexistent", serde_json::json!(1))
        .unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));

    let err = engine
        .set_value("nowhere.at_all", serde_json::json!(1))
        .unwrap_err();
    assert!(matches!(err, SettingsError::InvalidKey(_)));
}

#[test]
fn test_set_value_rejects_malformed_key() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    for key in ["", "watchdog.", ".tabs", "watchdog..stuck_timeout_secs"] {
        let err = engine.set_value(key, serde_json::json!(1)).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidKey(_)), "key {:?}", key);
    }
}

#[test]
fn test_set_value_rejects_wrong_type() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    let err = engine
        .set_value("watchdog.diagnostic_mode", serde_json::json!("sometimes"))
        .unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue(_)));
    assert!(!engine.get_settings().watchdog.diagnostic_mode);
}

#[test]
fn test_diagnostic_mode_shortens_stuck_timeout() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    engine
        .set_value("watchdog.diagnostic_mode", serde_json::json!(true))
        .unwrap();

    assert_eq!(
        engine.get_settings().watchdog.stuck_timeout(),
        Duration::from_secs(5)
    );
}

#[test]
fn test_zero_icon_interval_disables_refresh() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);

    engine
        .set_value("tabs.icon_refresh_interval_secs", serde_json::json!(0))
        .unwrap();

    assert_eq!(engine.get_settings().tabs.icon_refresh_interval(), None);
}

#[test]
fn test_reset_restores_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in_temp(&dir);
    engine
        .set_value("watchdog.pre_start_timeout_secs", serde_json::json!(99))
        .unwrap();

    engine.reset().unwrap();

    assert_eq!(engine.get_settings(), &ShellSettings::default());
    let mut reloaded = engine_in_temp(&dir);
    assert_eq!(reloaded.load().unwrap(), ShellSettings::default());
}

#[test]
fn test_partial_file_fills_missing_sections() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.json"),
        r#"{"tabs": {"icon_refresh_interval_secs": 60, "extra_headers": {}}}"#,
    )
    .unwrap();

    let mut engine = engine_in_temp(&dir);
    let settings = engine.load().unwrap();

    assert_eq!(settings.tabs.icon_refresh_interval_secs, 60);
    assert_eq!(settings.watchdog, WatchdogSettings::default());
}

#[test]
fn test_malformed_file_is_a_serialization_error() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("settings.json"), "{ not json").unwrap();

    let mut engine = engine_in_temp(&dir);
    let err = engine.load().unwrap_err();

    assert!(matches!(err, SettingsError::SerializationError(_)));
}

#[test]
fn test_save_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("settings.json");
    let engine = SettingsEngine::new(Some(path.to_string_lossy().to_string()));

    engine.save().unwrap();

    assert!(path.exists());
}
