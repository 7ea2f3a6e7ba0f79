// Tests for settings and rule override files

use linkward_core::settings::{Settings, SettingsError};
use linkward_scanner::RuleSet;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.json");

    let mut settings = Settings::default();
    settings.link_types.onedrive = false;
    settings.external_status_codes.success = false;
    settings.save(&path, false).unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);

    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"linkTypes\""));
    assert!(raw.contains("\"externalStatusCodes\""));
    assert!(raw.contains("\"2xx\": false"));
}

#[test]
fn test_save_refuses_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    Settings::default().save(&path, false).unwrap();

    let err = Settings::default().save(&path, false).unwrap_err();
    assert!(matches!(err, SettingsError::AlreadyExists(_)));

    Settings::default().save(&path, true).unwrap();
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{ not json").unwrap();

    let err = Settings::load(&path).unwrap_err();
    assert!(matches!(err, SettingsError::Parse { .. }));
    assert!(err.to_string().contains("settings.json"));
}

#[test]
fn test_partial_settings_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"externalStatusCodes": {"2xx": false}}"#).unwrap();

    let settings = Settings::load(&path).unwrap();
    assert!(!settings.external_status_codes.success);
    assert!(settings.external_status_codes.network);
    assert!(settings.link_types.teams);
}

// ============================================================================
// Rule Overrides
// ============================================================================

#[test]
fn test_rule_override_replaces_only_given_lists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"{"firstPartyDomains": [" Contoso.COM "]}"#).unwrap();

    let rules = RuleSet::from_file(&path).unwrap();
    assert_eq!(rules.first_party_domains, vec!["contoso.com".to_string()]);
    assert_eq!(rules.sharing_domains, RuleSet::default().sharing_domains);
    assert_eq!(rules.team_path_segment, "/teams/");
}

#[test]
fn test_rule_override_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");
    fs::write(&path, r#"{"firstPartyDomains": "not a list"}"#).unwrap();
    assert!(RuleSet::from_file(&path).is_err());
}
