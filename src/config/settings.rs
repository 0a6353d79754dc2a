//! Run settings.
//!
//! Settings are a flat string-keyed map loaded once before a run. Nothing
//! mutates them afterwards: checks receive `&Settings` and the type exposes
//! no mutating methods after construction.

use crate::SettingsError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Default number of rows a check lists when `row_limit` is unset
pub const DEFAULT_ROW_LIMIT: i64 = 10;

/// Default primary node name for cross-node checks
pub const DEFAULT_PRIMARY_NODE: &str = "primary";

/// Immutable run settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: BTreeMap<String, Value>,
}

impl Settings {
    /// Build settings from key/value pairs
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Settings {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let values: BTreeMap<String, Value> =
            toml::from_str(content).map_err(|e| SettingsError::Parse {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        Ok(Settings { values })
    }

    /// Parse settings from a JSON object
    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        let values: BTreeMap<String, Value> =
            serde_json::from_str(content).map_err(|e| SettingsError::Parse {
                path: "<string>".to_string(),
                message: e.to_string(),
            })?;
        Ok(Settings { values })
    }

    /// Load settings from a `.toml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: display.clone(),
            message: e.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let parsed = match extension.as_str() {
            "toml" => Self::from_toml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => return Err(SettingsError::UnsupportedFormat(display)),
        };

        parsed.map_err(|e| match e {
            SettingsError::Parse { message, .. } => SettingsError::Parse {
                path: display,
                message,
            },
            other => other,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Compare a setting against an expected value; unset never matches.
    /// Numbers compare by value, so `10.0` matches `10`.
    pub fn matches(&self, key: &str, expected: &Value) -> bool {
        match (self.values.get(key), expected) {
            (None, _) => false,
            (Some(Value::Number(actual)), Value::Number(expected)) => actual.as_f64() == expected.as_f64(),
            (Some(actual), expected) => actual == expected,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Echo query text into the report
    pub fn show_qry(&self) -> bool {
        self.get_bool("show_qry").unwrap_or(false)
    }

    /// Include managed-service notes
    pub fn is_aurora(&self) -> bool {
        self.get_bool("is_aurora").unwrap_or(false)
    }

    pub fn row_limit(&self) -> i64 {
        self.get_i64("row_limit")
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_ROW_LIMIT)
    }

    /// Whether the statement statistics extension is installed
    pub fn has_pgstat(&self) -> bool {
        self.get_bool("has_pgstat").unwrap_or(false)
    }

    pub fn min_tup_ins_threshold(&self) -> i64 {
        self.get_i64("min_tup_ins_threshold").unwrap_or(0)
    }

    pub fn primary_node(&self) -> &str {
        self.get_str("primary_node").unwrap_or(DEFAULT_PRIMARY_NODE)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
