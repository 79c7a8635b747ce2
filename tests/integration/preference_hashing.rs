//! Preference canonicalization and hashing across input formats

use mealplan::preferences::{
    hash_canonical, hash_preferences, CanonicalPreferences, PreferenceHash, PreferenceSnapshot,
};
use std::str::FromStr;
use tempfile::TempDir;

#[test]
fn test_toml_and_json_files_hash_identically() {
    let dir = TempDir::new().unwrap();
    let toml_path = dir.path().join("prefs.toml");
    let json_path = dir.path().join("prefs.json");

    std::fs::write(
        &toml_path,
        r#"
allergies = ["Peanut", "sesame"]
cuisine_preferences = ["Greek"]
skill_level = "Beginner"

[routine.tue]
context = "high_activity"
"#,
    )
    .unwrap();
    std::fs::write(
        &json_path,
        r#"{
            "allergies": ["  SESAME ", "peanut", "Peanut"],
            "cuisine_preferences": ["greek"],
            "skill_level": "beginner",
            "routine": {"Tuesday": {"context": "High-Activity"}}
        }"#,
    )
    .unwrap();

    let from_toml = PreferenceSnapshot::from_path(&toml_path).unwrap();
    let from_json = PreferenceSnapshot::from_path(&json_path).unwrap();
    assert_eq!(hash_preferences(&from_toml), hash_preferences(&from_json));
}

#[test]
fn test_composed_and_decomposed_unicode_hash_identically() {
    let composed = PreferenceSnapshot {
        cuisine_preferences: vec!["Cr\u{e8}me".to_string()],
        ..Default::default()
    };
    let decomposed = PreferenceSnapshot {
        cuisine_preferences: vec!["cre\u{300}me".to_string()],
        ..Default::default()
    };
    assert_eq!(hash_preferences(&composed), hash_preferences(&decomposed));
}

#[test]
fn test_default_routine_equals_explicit_defaults() {
    let implicit = PreferenceSnapshot::default();
    let explicit: PreferenceSnapshot = serde_json::from_str(
        r#"{"routine": {"saturday": {"context": "low-constraint"}, "sunday": {"context": "home"},
            "monday": {"context": "office"}}}"#,
    )
    .unwrap();
    assert_eq!(hash_preferences(&implicit), hash_preferences(&explicit));
}

#[test]
fn test_routine_flag_changes_hash() {
    let base = PreferenceSnapshot::default();
    let flagged: PreferenceSnapshot =
        serde_json::from_str(r#"{"routine": {"monday": {"portable_meal_needed": true}}}"#).unwrap();
    assert_ne!(hash_preferences(&base), hash_preferences(&flagged));
}

#[test]
fn test_canonical_json_has_sorted_keys_and_all_days() {
    let canonical = CanonicalPreferences::from_snapshot(&PreferenceSnapshot::default());
    let text = canonical.to_json_string();
    let allergies = text.find("\"allergies\"").unwrap();
    let routine = text.find("\"routine\"").unwrap();
    let time = text.find("\"time_preference\"").unwrap();
    assert!(allergies < routine && routine < time);
    assert_eq!(canonical.routine.len(), 7);
    assert_eq!(
        hash_canonical(&canonical),
        hash_preferences(&PreferenceSnapshot::default())
    );
}

#[test]
fn test_hash_hex_parses_back() {
    let hash = hash_preferences(&PreferenceSnapshot::default());
    let parsed = PreferenceHash::from_str(&hash.to_hex()).unwrap();
    assert_eq!(parsed, hash);
    assert!(PreferenceHash::from_str("not-hex").is_err());
}

#[test]
fn test_missing_preferences_file_is_invalid_request() {
    let dir = TempDir::new().unwrap();
    let err = PreferenceSnapshot::from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read preferences"));
}
