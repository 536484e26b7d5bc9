//! Configuration resolution for the relay pipeline.
//!
//! The host hands plugins their settings as a raw [`serde_json::Value`]
//! section, so values may arrive loosely typed (`"5"` instead of `5`,
//! `"true"` instead of `true`). [`RelayConfig::resolve`] overlays the raw
//! section onto the defaults field by field, coercing each value into its
//! strong type and falling back to the default when a value is absent,
//! empty, or unparsable. Unrecognized keys are ignored.
//!
//! Resolution happens once at initialization; the resolved record is
//! immutable for the rest of the process lifetime.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::ConfigError;

/// Default cap on matches forwarded per message.
pub const DEFAULT_MAX_MATCHES: i64 = 1;

/// Default per-dispatch timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// The resolved, strongly typed relay configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelayConfig {
    /// Master switch; `false` keeps the pipeline inert.
    pub enabled: bool,
    /// Regex applied to every inbound message body. Empty disables the
    /// pipeline.
    pub pattern: String,
    /// Endpoint receiving one POST per forwarded match. Must carry an
    /// `http://` or `https://` scheme to activate.
    pub api_url: String,
    /// Maximum matches forwarded per message; zero or negative means
    /// unlimited.
    pub max_matches: i64,
    /// Per-dispatch timeout in seconds.
    pub timeout_secs: u64,
    /// Extra request headers, in configuration order.
    pub headers: Vec<(String, String)>,
    /// Send the whole matched text as `{"data": ...}` instead of the
    /// structured `{"code", "price"}` payload.
    pub legacy_payload: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern: String::new(),
            api_url: String::new(),
            max_matches: DEFAULT_MAX_MATCHES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: Vec::new(),
            legacy_payload: false,
        }
    }
}

impl RelayConfig {
    /// Resolves a raw configuration section into a typed record.
    ///
    /// Fails only when the section is absent, `null`, or an empty object;
    /// every recognized field falls back to its default on a missing or
    /// unusable value. The resolved record is logged once for
    /// observability.
    pub fn resolve(raw: &Value) -> Result<Self, ConfigError> {
        let map = match raw {
            Value::Object(map) if !map.is_empty() => map,
            _ => return Err(ConfigError::Missing),
        };

        let defaults = Self::default();
        let resolved = Self {
            enabled: coerce_bool(map.get("enabled")).unwrap_or(defaults.enabled),
            pattern: coerce_string(map.get("pattern")),
            api_url: coerce_string(map.get("api_url")),
            max_matches: coerce_int(map.get("max_matches")).unwrap_or(defaults.max_matches),
            // A zero timeout would make every dispatch fail; treat it the
            // same as an absent value.
            timeout_secs: match coerce_int(map.get("timeout")) {
                Some(secs) if secs > 0 => secs as u64,
                _ => defaults.timeout_secs,
            },
            headers: resolve_headers(map.get("headers")),
            legacy_payload: coerce_bool(map.get("legacy_payload"))
                .unwrap_or(defaults.legacy_payload),
        };

        info!(
            enabled = resolved.enabled,
            pattern = %resolved.pattern,
            api_url = %resolved.api_url,
            max_matches = resolved.max_matches,
            timeout_secs = resolved.timeout_secs,
            header_count = resolved.headers.len(),
            legacy_payload = resolved.legacy_payload,
            "Resolved relay configuration"
        );

        Ok(resolved)
    }

    /// Returns `true` if `api_url` carries an HTTP scheme.
    pub fn has_http_scheme(&self) -> bool {
        self.api_url.starts_with("http://") || self.api_url.starts_with("https://")
    }
}

/// Coerces a JSON value into a bool, accepting numeric and textual spellings.
fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Coerces a JSON value into an integer, accepting numeric strings.
fn coerce_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerces a JSON scalar into a trimmed string; anything else becomes empty.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Builds the header list from a raw `[{key, value}, ...]` array.
///
/// Keys and values are trimmed independently; entries whose trimmed key is
/// empty are dropped, and a missing value becomes the empty string.
fn resolve_headers(value: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let item = entry.as_object()?;
            let key = coerce_string(item.get("key"));
            if key.is_empty() {
                return None;
            }
            Some((key, coerce_string(item.get("value"))))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_or_empty_raw_config_is_missing() {
        assert!(matches!(
            RelayConfig::resolve(&Value::Null),
            Err(ConfigError::Missing)
        ));
        assert!(matches!(
            RelayConfig::resolve(&json!({})),
            Err(ConfigError::Missing)
        ));
        assert!(matches!(
            RelayConfig::resolve(&json!([1, 2])),
            Err(ConfigError::Missing)
        ));
    }

    #[test]
    fn unset_fields_fall_back_to_defaults() {
        let config = RelayConfig::resolve(&json!({"api_url": "https://x"})).unwrap();

        assert!(config.enabled);
        assert_eq!(config.pattern, "");
        assert_eq!(config.api_url, "https://x");
        assert_eq!(config.max_matches, DEFAULT_MAX_MATCHES);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.headers.is_empty());
        assert!(!config.legacy_payload);
    }

    #[test]
    fn loosely_typed_values_are_coerced() {
        let config = RelayConfig::resolve(&json!({
            "enabled": "false",
            "pattern": "  \\d+  ",
            "api_url": " https://x ",
            "max_matches": "3",
            "timeout": "10",
        }))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.pattern, "\\d+");
        assert_eq!(config.api_url, "https://x");
        assert_eq!(config.max_matches, 3);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_falls_back_but_zero_cap_is_kept() {
        let config = RelayConfig::resolve(&json!({
            "max_matches": 0,
            "timeout": 0,
        }))
        .unwrap();

        // max_matches = 0 is meaningful (unlimited); timeout = 0 is not.
        assert_eq!(config.max_matches, 0);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn negative_max_matches_is_kept() {
        let config = RelayConfig::resolve(&json!({"max_matches": -1})).unwrap();
        assert_eq!(config.max_matches, -1);
    }

    #[test]
    fn headers_are_trimmed_and_blank_keys_dropped() {
        let config = RelayConfig::resolve(&json!({
            "headers": [
                {"key": " X-Token ", "value": " secret "},
                {"key": "   "},
                {"key": "X-Empty"},
                "not-an-object",
            ],
        }))
        .unwrap();

        assert_eq!(
            config.headers,
            vec![
                ("X-Token".to_string(), "secret".to_string()),
                ("X-Empty".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn unrecognized_keys_are_ignored() {
        let config = RelayConfig::resolve(&json!({
            "api_url": "https://x",
            "no_such_option": 42,
        }))
        .unwrap();

        assert_eq!(config.api_url, "https://x");
    }

    #[test]
    fn resolution_is_idempotent() {
        let raw = json!({
            "enabled": 1,
            "pattern": "(a)(b)",
            "api_url": "https://x",
            "max_matches": "2",
            "headers": [{"key": "A", "value": "b"}],
        });

        let first = RelayConfig::resolve(&raw).unwrap();
        let second = RelayConfig::resolve(&raw).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn http_scheme_check() {
        let mut config = RelayConfig {
            api_url: "https://x".to_string(),
            ..Default::default()
        };
        assert!(config.has_http_scheme());

        config.api_url = "http://x".to_string();
        assert!(config.has_http_scheme());

        config.api_url = "ftp://x".to_string();
        assert!(!config.has_http_scheme());
    }
}
