//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RelaySettings::default()`]
//! 2. If the settings file exists, deep-merge its values over defaults
//! 3. Apply `RELAY_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::RelaySettings;

/// Resolve the path to the settings file (`~/.relay/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".relay").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RelaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. Invalid JSON or a merged
/// result that fails [`RelaySettings::validate`] is an error.
pub fn load_settings_from_path(path: &Path) -> Result<RelaySettings> {
    load_with(path, |name| std::env::var(name).ok())
}

fn load_with<F>(path: &Path, lookup: F) -> Result<RelaySettings>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = serde_json::to_value(RelaySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: RelaySettings = serde_json::from_value(merged)?;
    apply_env_overrides_from(&mut settings, lookup);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `RELAY_*` environment variable overrides from the process env.
pub fn apply_env_overrides(settings: &mut RelaySettings) {
    apply_env_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides using `lookup` to resolve variable names.
///
/// Each variable has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are logged and ignored (fall back to file/default)
pub fn apply_env_overrides_from<F>(settings: &mut RelaySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = env.string("RELAY_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = env.u16("RELAY_PORT", 0, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = env.usize("RELAY_MAX_SESSIONS", 1, 100_000) {
        settings.server.max_sessions = v;
    }
    if let Some(v) = env.u64("RELAY_SESSION_TIMEOUT", 1, 86_400) {
        settings.server.session_timeout_secs = v;
    }
    if let Some(v) = env.u64("RELAY_HEARTBEAT_INTERVAL", 1, 3_600) {
        settings.server.heartbeat_interval_secs = v;
    }
    if let Some(v) = env.string("RELAY_PROTOCOL_VERSION") {
        settings.server.protocol_version = v;
    }
    if let Some(v) = env.string("RELAY_SERVER_NAME") {
        settings.server.name = v;
    }

    // ── Downstream ──────────────────────────────────────────────────
    if let Some(v) = env.string("RELAY_DOWNSTREAM_URL") {
        settings.downstream.base_url = v;
    }
    if let Some(v) = env.u64("RELAY_DOWNSTREAM_TIMEOUT", 1, 3_600) {
        settings.downstream.request_timeout_secs = v;
    }
    if let Some(v) = env.string("RELAY_CATALOG_PATH") {
        settings.downstream.catalog_path = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("RELAY_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = env.bool("RELAY_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions ──────────────────────────────────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers ─────────────────────────────────────────────────────────

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn parsed<T>(&self, name: &str, kind: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let val = (self.lookup)(name)?;
        let result = parse(&val);
        if result.is_none() {
            warn!(key = name, value = %val, kind, "invalid env var, ignoring");
        }
        result
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.parsed(name, "bool", parse_bool)
    }

    fn u16(&self, name: &str, min: u16, max: u16) -> Option<u16> {
        self.parsed(name, "u16", |v| parse_u16_range(v, min, max))
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        self.parsed(name, "u64", |v| parse_u64_range(v, min, max))
    }

    fn usize(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        self.parsed(name, "usize", |v| parse_usize_range(v, min, max))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn deep_merge_objects_recursively() {
        let target = json!({"a": {"b": 1, "c": 2}});
        let source = json!({"a": {"b": 10}});
        assert_eq!(deep_merge(target, source), json!({"a": {"b": 10, "c": 2}}));
    }

    #[test]
    fn deep_merge_replaces_arrays() {
        let target = json!({"a": [1, 2, 3]});
        let source = json!({"a": [4]});
        assert_eq!(deep_merge(target, source), json!({"a": [4]}));
    }

    #[test]
    fn deep_merge_skips_null() {
        let target = json!({"a": 1, "b": 2});
        let source = json!({"a": null, "b": 3});
        assert_eq!(deep_merge(target, source), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn deep_merge_adds_new_keys() {
        let target = json!({"a": 1});
        let source = json!({"b": 2});
        assert_eq!(deep_merge(target, source), json!({"a": 1, "b": 2}));
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for v in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "0", "no", "Off"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_ranges() {
        assert_eq!(parse_u16_range("8080", 1, 65535), Some(8080));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("abc", 1, 65535), None);
        assert_eq!(parse_u64_range("30", 1, 3600), Some(30));
        assert_eq!(parse_u64_range("9999", 1, 3600), None);
        assert_eq!(parse_usize_range("-1", 1, 10), None);
        assert_eq!(parse_usize_range("10", 1, 10), Some(10));
    }

    // ── env overrides ───────────────────────────────────────────────

    #[test]
    fn env_overrides_apply() {
        let mut s = RelaySettings::default();
        apply_env_overrides_from(
            &mut s,
            env_of(&[
                ("RELAY_HOST", "0.0.0.0"),
                ("RELAY_PORT", "4000"),
                ("RELAY_MAX_SESSIONS", "5"),
                ("RELAY_SESSION_TIMEOUT", "60"),
                ("RELAY_HEARTBEAT_INTERVAL", "10"),
                ("RELAY_PROTOCOL_VERSION", "2025-01-01"),
                ("RELAY_SERVER_NAME", "edge"),
                ("RELAY_DOWNSTREAM_URL", "http://api.internal"),
                ("RELAY_DOWNSTREAM_TIMEOUT", "5"),
                ("RELAY_CATALOG_PATH", "/etc/relay/catalog.json"),
                ("RELAY_LOG_LEVEL", "debug"),
                ("RELAY_LOG_JSON", "yes"),
            ]),
        );
        assert_eq!(s.server.host, "0.0.0.0");
        assert_eq!(s.server.port, 4000);
        assert_eq!(s.server.max_sessions, 5);
        assert_eq!(s.server.session_timeout_secs, 60);
        assert_eq!(s.server.heartbeat_interval_secs, 10);
        assert_eq!(s.server.protocol_version, "2025-01-01");
        assert_eq!(s.server.name, "edge");
        assert_eq!(s.downstream.base_url, "http://api.internal");
        assert_eq!(s.downstream.request_timeout_secs, 5);
        assert_eq!(
            s.downstream.catalog_path.as_deref(),
            Some("/etc/relay/catalog.json")
        );
        assert_eq!(s.logging.level, "debug");
        assert!(s.logging.json);
    }

    #[test]
    fn invalid_env_values_are_ignored() {
        let mut s = RelaySettings::default();
        apply_env_overrides_from(
            &mut s,
            env_of(&[
                ("RELAY_PORT", "not-a-port"),
                ("RELAY_MAX_SESSIONS", "0"),
                ("RELAY_LOG_JSON", "sometimes"),
                ("RELAY_HOST", ""),
            ]),
        );
        assert_eq!(s.server.port, 3001);
        assert_eq!(s.server.max_sessions, 100);
        assert!(!s.logging.json);
        assert_eq!(s.server.host, "127.0.0.1");
    }

    // ── file loading ────────────────────────────────────────────────

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_with(&dir.path().join("nope.json"), no_env).unwrap();
        assert_eq!(s.server.port, 3001);
        assert_eq!(s.downstream.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"server":{"port":9100,"maxSessions":2},"downstream":{"baseUrl":"http://x"}}"#,
        )
        .unwrap();
        let s = load_with(&path, no_env).unwrap();
        assert_eq!(s.server.port, 9100);
        assert_eq!(s.server.max_sessions, 2);
        assert_eq!(s.server.session_timeout_secs, 300);
        assert_eq!(s.downstream.base_url, "http://x");
        assert_eq!(s.downstream.credential_check_path, "/auth/validate");
    }

    #[test]
    fn env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"port":9100}}"#).unwrap();
        let s = load_with(&path, env_of(&[("RELAY_PORT", "9200")])).unwrap();
        assert_eq!(s.server.port, 9200);
    }

    #[test]
    fn invalid_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_with(&path, no_env).unwrap_err();
        assert!(matches!(&err, SettingsError::Parse { path: p, .. } if *p == path));
    }

    #[test]
    fn wrongly_typed_field_is_shape_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"port":"eighty"}}"#).unwrap();
        let err = load_with(&path, no_env).unwrap_err();
        assert!(matches!(err, SettingsError::Shape(_)));
    }

    #[test]
    fn unreadable_file_is_read_error_with_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory exists but cannot be read as a file.
        let err = load_with(dir.path(), no_env).unwrap_err();
        assert!(matches!(&err, SettingsError::Read { path, .. } if path == dir.path()));
    }

    #[test]
    fn invalid_merged_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server":{"maxSessions":0}}"#).unwrap();
        let err = load_with(&path, no_env).unwrap_err();
        assert_eq!(err.field(), Some("server.maxSessions"));
    }

    #[test]
    fn settings_path_ends_with_relay_dir() {
        let p = settings_path();
        assert!(p.ends_with(".relay/settings.json"));
    }
}
