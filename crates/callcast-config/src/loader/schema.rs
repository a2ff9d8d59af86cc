//! Key and type checks applied to every config layer before merging.
//!
//! Layers are partial, so only keys that are present are checked. Unknown
//! keys are rejected to catch typos early.

use crate::ConfigError;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Text,
    OptionalText,
    Flag,
    Port,
    Count,
}

const TOP_LEVEL: &[&str] = &["$schema", "server", "hub"];

const SERVER_FIELDS: &[(&str, Kind)] = &[
    ("host", Kind::Text),
    ("port", Kind::Port),
    ("public_url", Kind::OptionalText),
    ("cors", Kind::Flag),
];

const HUB_FIELDS: &[(&str, Kind)] = &[
    ("transcript_capacity", Kind::Count),
    ("snapshot_size", Kind::Count),
    ("call_expiry_secs", Kind::Count),
    ("recent_activity_secs", Kind::Count),
    ("subscriber_buffer", Kind::Count),
];

/// Check one layer; `label` names the layer in error paths.
pub(super) fn check(value: &Value, label: &str) -> Result<(), ConfigError> {
    let root = as_object(value, label, "root")?;
    for (key, value) in root {
        match key.as_str() {
            "$schema" => check_kind(value, Kind::Text, label, key)?,
            "server" => check_section(value, SERVER_FIELDS, label, key)?,
            "hub" => check_section(value, HUB_FIELDS, label, key)?,
            _ => {
                return Err(error(
                    label,
                    key,
                    &format!("unknown key (expected one of {})", TOP_LEVEL.join(", ")),
                ));
            }
        }
    }
    Ok(())
}

fn check_section(
    value: &Value,
    fields: &[(&str, Kind)],
    label: &str,
    section: &str,
) -> Result<(), ConfigError> {
    for (key, value) in as_object(value, label, section)? {
        let path = format!("{section}.{key}");
        let Some((_, kind)) = fields.iter().find(|(name, _)| name == key) else {
            return Err(error(label, &path, "unknown key"));
        };
        check_kind(value, *kind, label, &path)?;
    }
    Ok(())
}

fn check_kind(value: &Value, kind: Kind, label: &str, path: &str) -> Result<(), ConfigError> {
    let ok = match kind {
        Kind::Text => value.is_string(),
        Kind::OptionalText => value.is_string() || value.is_null(),
        Kind::Flag => value.is_boolean(),
        Kind::Port => value
            .as_u64()
            .is_some_and(|port| port <= u64::from(u16::MAX)),
        Kind::Count => value.is_u64(),
    };
    if ok {
        return Ok(());
    }
    let expected = match kind {
        Kind::Text => "expected string",
        Kind::OptionalText => "expected string or null",
        Kind::Flag => "expected bool",
        Kind::Port => "expected port number",
        Kind::Count => "expected non-negative integer",
    };
    Err(error(label, path, expected))
}

fn as_object<'a>(
    value: &'a Value,
    label: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value
        .as_object()
        .ok_or_else(|| error(label, path, "expected object"))
}

fn error(label: &str, path: &str, reason: &str) -> ConfigError {
    ConfigError::invalid(format!("{label}:{path}"), reason)
}

#[cfg(test)]
mod tests {
    use super::check;
    use crate::ConfigError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn failing_path(value: serde_json::Value) -> String {
        match check(&value, "test") {
            Err(ConfigError::Invalid { path, .. }) => path,
            other => panic!("expected invalid value, got {other:?}"),
        }
    }

    #[test]
    fn partial_layers_pass() {
        check(&json!({ "hub": { "snapshot_size": 5 } }), "test").expect("valid");
        check(&json!({ "server": { "public_url": null } }), "test").expect("valid");
    }

    #[test]
    fn reports_the_offending_path() {
        assert_eq!(failing_path(json!([])), "test:root");
        assert_eq!(failing_path(json!({ "hub": { "capacity": 1 } })), "test:hub.capacity");
        assert_eq!(
            failing_path(json!({ "hub": { "snapshot_size": -1 } })),
            "test:hub.snapshot_size"
        );
        assert_eq!(failing_path(json!({ "server": { "cors": "yes" } })), "test:server.cors");
        assert_eq!(failing_path(json!({ "server": "x" })), "test:server");
    }
}
