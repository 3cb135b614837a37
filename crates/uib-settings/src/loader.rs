//! Layering a host JSON document over the compiled client defaults.
//!
//! The defaults are serialized to JSON, the host document is merged on top,
//! and the result is deserialized and validated. Merging walks objects key
//! by key; any other value in the host document replaces the default
//! outright, so `transports: ["websocket"]` drops polling rather than
//! appending. A `null` inside an object means "keep the default".

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::ClientSettings;

/// Load settings from a JSON document layered over the defaults.
pub fn load_settings_from_str(json: &str) -> Result<ClientSettings> {
    let overrides: Value = serde_json::from_str(json)?;
    let defaults = serde_json::to_value(ClientSettings::default())?;
    let settings: ClientSettings = serde_json::from_value(deep_merge(defaults, overrides))?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a JSON file layered over the defaults.
///
/// A missing file yields the defaults; unreadable or invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ClientSettings> {
    if !path.exists() {
        debug!(?path, "no client settings file, using defaults");
        return Ok(ClientSettings::default());
    }
    debug!(?path, "loading client settings");
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_settings_from_str(&content)
}

/// Overlay `overrides` onto `defaults` and return the combined document.
pub fn deep_merge(mut defaults: Value, overrides: Value) -> Value {
    overlay(&mut defaults, overrides);
    defaults
}

fn overlay(slot: &mut Value, incoming: Value) {
    match (slot, incoming) {
        (Value::Object(fields), Value::Object(incoming)) => {
            for (key, value) in incoming {
                if value.is_null() {
                    continue;
                }
                match fields.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        let _ = fields.insert(key, value);
                    }
                }
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransportKind;
    use assert_matches::assert_matches;

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"retry": {"factor": 1.5, "initialDelayMs": 2000}});
        let source = serde_json::json!({"retry": {"factor": 2.0}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["retry"]["factor"], 2.0);
        assert_eq!(merged["retry"]["initialDelayMs"], 2000);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"transports": ["polling", "websocket"]});
        let source = serde_json::json!({"transports": ["websocket"]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["transports"], serde_json::json!(["websocket"]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_new_keys_added() {
        let merged = deep_merge(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_object_replaces_primitive() {
        let defaults = serde_json::json!({"debug": false});
        let overrides = serde_json::json!({"debug": {"level": "verbose"}});
        assert_eq!(
            deep_merge(defaults, overrides)["debug"],
            serde_json::json!({"level": "verbose"})
        );
    }

    #[test]
    fn merge_nested_null_keeps_default() {
        let defaults = serde_json::json!({"retry": {"factor": 1.5, "maxDelayMs": 0}});
        let overrides = serde_json::json!({"retry": {"factor": null, "maxDelayMs": 30000}});
        let merged = deep_merge(defaults, overrides);
        assert_eq!(merged["retry"]["factor"], 1.5);
        assert_eq!(merged["retry"]["maxDelayMs"], 30000);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        assert_eq!(deep_merge(target, source)["a"], 42);
    }

    // ── load_settings_from_str ──────────────────────────────────────

    #[test]
    fn empty_document_returns_defaults() {
        let settings = load_settings_from_str("{}").unwrap();
        assert_eq!(settings.retry.initial_delay_ms, 2000);
        assert_eq!(settings.channels.server, "uiBuilder");
    }

    #[test]
    fn partial_document_overrides() {
        let settings = load_settings_from_str(
            r#"{"retry": {"maxDelayMs": 0}, "injection": {"allowScript": false}, "debug": true}"#,
        )
        .unwrap();
        assert_eq!(settings.retry.max_delay(), None);
        assert!((settings.retry.factor - 1.5).abs() < f64::EPSILON);
        assert!(!settings.injection.allow_script);
        assert!(settings.injection.allow_style);
        assert!(settings.debug);
    }

    #[test]
    fn transport_list_is_replaced() {
        let settings = load_settings_from_str(r#"{"transports": ["websocket"]}"#).unwrap();
        assert_eq!(settings.transports, vec![TransportKind::Websocket]);
    }

    #[test]
    fn invalid_json_is_error() {
        assert_matches!(
            load_settings_from_str("not json"),
            Err(SettingsError::Json(_))
        );
    }

    #[test]
    fn unknown_transport_is_error() {
        assert_matches!(
            load_settings_from_str(r#"{"transports": ["carrier-pigeon"]}"#),
            Err(SettingsError::Json(_))
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(
            load_settings_from_str(r#"{"retry": {"factor": 0.9}}"#),
            Err(SettingsError::InvalidValue(_))
        );
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn missing_file_returns_defaults() {
        let settings = load_settings_from_path(Path::new("/nonexistent/uibuilder.json")).unwrap();
        assert_eq!(settings.io_path, "/uibuilder/socket.io");
    }

    #[test]
    fn file_is_layered_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uibuilder.json");
        std::fs::write(&path, r#"{"ioPath": "/custom/socket.io"}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.io_path, "/custom/socket.io");
        assert_eq!(settings.retry.initial_delay_ms, 2000);
    }

    #[test]
    fn invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uibuilder.json");
        std::fs::write(&path, "{broken").unwrap();

        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn unreadable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_settings_from_path(dir.path());
        assert_matches!(result, Err(SettingsError::Io { path, .. }) if path == dir.path());
    }
}
