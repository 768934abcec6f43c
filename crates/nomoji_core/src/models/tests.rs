use super::config::*;
use super::presets::*;
use chrono::{TimeZone, Utc};
use serde_json::json;

#[test]
fn default_template_matches_product_defaults() {
    let config = default_config();
    assert_eq!(config.version, "1.0.0");
    assert!(config.enabled);
    assert_eq!(config.contexts.comments.severity, Severity::Moderate);
    assert!(!config.contexts.user_interface.enabled);
    assert_eq!(config.allowed_contexts(), ["userInterface".to_string()]);
    assert!(config.custom_rules.is_none());
    assert!(config.metadata.is_none());
}

#[test]
fn configuration_serializes_with_camel_case_keys() {
    let value = serde_json::to_value(default_config()).expect("serialize");
    assert!(value["contexts"]["commitMessages"]["enabled"].as_bool().unwrap());
    assert_eq!(value["contexts"]["userInterface"]["severity"], "relaxed");
    assert_eq!(value["exceptions"]["allowedContexts"], json!(["userInterface"]));
    assert!(value.get("customRules").is_none());
}

#[test]
fn metadata_timestamps_use_millisecond_iso_format() {
    let metadata = Metadata {
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 30, 5).unwrap(),
        user_id: Some("alice".to_string()),
    };
    let value = serde_json::to_value(&metadata).expect("serialize");
    assert_eq!(value["createdAt"], "2024-03-01T12:00:00.000Z");
    assert_eq!(value["updatedAt"], "2024-03-02T08:30:05.000Z");
    assert_eq!(value["userId"], "alice");

    let parsed: Metadata = serde_json::from_value(value).expect("deserialize");
    assert_eq!(parsed, metadata);
}

#[test]
fn update_rejects_unknown_keys_and_wrong_types() {
    let unknown = serde_json::from_value::<ConfigUpdate>(json!({"enabled": true, "colour": "red"}));
    assert!(unknown.is_err());

    let wrong_type = serde_json::from_value::<ConfigUpdate>(json!({"enabled": "yes"}));
    assert!(wrong_type.is_err());

    let bad_severity = serde_json::from_value::<ConfigUpdate>(json!({
        "contexts": {"console": {"enabled": true, "severity": "extreme"}}
    }));
    assert!(bad_severity.is_err());

    let unknown_context = serde_json::from_value::<ConfigUpdate>(json!({
        "contexts": {"tooltips": {"enabled": true, "severity": "strict"}}
    }));
    assert!(unknown_context.is_err());
}

#[test]
fn update_rejects_explicit_nulls() {
    for field in ["version", "enabled", "contexts", "exceptions", "customRules"] {
        let err = serde_json::from_value::<ConfigUpdate>(json!({ field: null }))
            .expect_err(field);
        assert!(err.to_string().contains("must not be null"), "{}: {}", field, err);
    }

    let null_context = serde_json::from_value::<ConfigUpdate>(json!({
        "contexts": {"console": null}
    }));
    assert!(null_context.is_err());

    let absent: ConfigUpdate = serde_json::from_value(json!({})).expect("empty update");
    assert_eq!(absent, ConfigUpdate::default());
}

#[test]
fn update_tolerates_client_metadata() {
    let update: ConfigUpdate = serde_json::from_value(json!({
        "enabled": false,
        "metadata": {"createdAt": "whenever", "userId": "mallory"}
    }))
    .expect("metadata is accepted");
    assert_eq!(update.enabled, Some(false));
}

#[test]
fn merge_replaces_only_present_top_level_fields() {
    let mut base = default_config().clone();
    base.custom_rules = Some(vec!["Prefer ASCII arrows".to_string()]);

    let merged = Configuration::merged(
        &base,
        ConfigUpdate {
            enabled: Some(false),
            ..ConfigUpdate::default()
        },
    );
    assert!(!merged.enabled);
    assert_eq!(merged.contexts, base.contexts);
    assert_eq!(merged.custom_rules(), ["Prefer ASCII arrows".to_string()]);
}

#[test]
fn merge_replaces_contexts_wholesale_from_default_template() {
    let base = Preset::Relaxed.config().clone();
    let update: ConfigUpdate = serde_json::from_value(json!({
        "contexts": {"comments": {"enabled": true, "severity": "strict"}}
    }))
    .expect("partial contexts");

    let merged = Configuration::merged(&base, update);
    assert_eq!(merged.contexts.comments.severity, Severity::Strict);
    // Console was disabled in `base`; the omitted key is refilled from the default template.
    assert!(merged.contexts.console.enabled);
    assert_eq!(
        merged.contexts.console,
        default_config().contexts.console
    );
}

#[test]
fn strict_preset_disallows_everything() {
    let strict = Preset::Strict.config();
    assert!(strict
        .contexts
        .iter()
        .all(|(_, policy)| policy.enabled && policy.severity == Severity::Strict));
    assert!(strict.allowed_contexts().is_empty());
    assert!(strict.contexts.console.custom_message.is_none());
}

#[test]
fn relaxed_preset_keeps_logging_strict() {
    let relaxed = Preset::Relaxed.config();
    assert_eq!(relaxed.contexts.logging.severity, Severity::Strict);
    assert!(!relaxed.contexts.console.enabled);
    assert_eq!(relaxed.allowed_contexts(), ["userInterface".to_string()]);
}

#[test]
fn preset_names_parse_exactly() {
    assert_eq!("moderate".parse::<Preset>().unwrap(), Preset::Moderate);
    for bad in ["Strict", "extreme", ""] {
        let err = bad.parse::<Preset>().expect_err("invalid preset");
        assert!(err.to_string().contains("Invalid preset name"));
    }
}

#[test]
fn preset_update_leaves_custom_rules_alone() {
    let update = Preset::Moderate.to_update();
    assert!(update.custom_rules.is_none());
    assert!(update.contexts.is_some());
}

#[test]
fn strictest_severity_ignores_disabled_contexts() {
    let mut config = Preset::Relaxed.config().clone();
    assert_eq!(config.strictest_severity(), Severity::Strict);

    config.contexts.logging.enabled = false;
    assert_eq!(config.strictest_severity(), Severity::Relaxed);
}
