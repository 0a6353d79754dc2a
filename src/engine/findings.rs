//! Run-scoped findings accumulation.
//!
//! Collects the structured result of every check module executed during a
//! run. Entries are keyed by the name the module chose; a later write under
//! the same key replaces the earlier one. Nothing is removed mid-run.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome tag of a structured finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    Success,
    Error,
}

/// One module's machine-readable result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFinding {
    pub status: FindingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StructuredFinding {
    /// Successful finding carrying `data`
    pub fn success(data: Value) -> Self {
        StructuredFinding {
            status: FindingStatus::Success,
            data: Some(data),
            details: None,
        }
    }

    /// Successful finding with an explanatory note instead of data
    pub fn note(details: impl Into<String>) -> Self {
        StructuredFinding {
            status: FindingStatus::Success,
            data: None,
            details: Some(details.into()),
        }
    }

    /// Failed finding
    pub fn error(details: impl Into<String>) -> Self {
        StructuredFinding {
            status: FindingStatus::Error,
            data: None,
            details: Some(details.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == FindingStatus::Error
    }
}

/// Structured mapping returned by one module invocation
pub type Findings = BTreeMap<String, StructuredFinding>;

/// Accumulator of structured findings for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindingsStore {
    entries: Findings,
    writes: u64,
}

impl FindingsStore {
    /// Create an empty store
    pub fn new() -> Self {
        FindingsStore::default()
    }

    /// Write a finding, replacing any earlier finding under `key`
    pub fn insert(&mut self, key: impl Into<String>, finding: StructuredFinding) {
        self.entries.insert(key.into(), finding);
        self.writes += 1;
    }

    /// Merge a module's structured mapping into the store
    pub fn merge(&mut self, findings: Findings) {
        for (key, finding) in findings {
            self.insert(key, finding);
        }
    }

    pub fn get(&self, key: &str) -> Option<&StructuredFinding> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of writes performed, including overwrites
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Iterate findings in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructuredFinding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys of all findings with error status
    pub fn error_keys(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, finding)| finding.is_error())
            .map(|(key, _)| key)
            .collect()
    }

    /// Borrow the underlying mapping
    pub fn as_map(&self) -> &Findings {
        &self.entries
    }

    /// Consume the store, returning the underlying mapping
    pub fn into_inner(self) -> Findings {
        self.entries
    }

    /// Serialize the store as a JSON object keyed by finding name
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.entries).unwrap_or(Value::Null)
    }

    /// Serialize the store as a JSON string
    pub fn to_json_string(&self, pretty: bool) -> String {
        let rendered = if pretty {
            serde_json::to_string_pretty(&self.entries)
        } else {
            serde_json::to_string(&self.entries)
        };
        rendered.unwrap_or_else(|_| "{}".to_string())
    }

    /// Persist the store as pretty JSON at `path`
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        std::fs::write(path, self.to_json_string(true))
    }
}
