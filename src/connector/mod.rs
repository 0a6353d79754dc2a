//! Backend connector capability interface.
//!
//! The engine never talks to a database, cache, or broker directly. Each run
//! owns exactly one [`Connector`] and lends it mutably to one check at a time.
//! Transports, timeouts, and retries are the connector's concern.

pub mod dialect;

use crate::ConnectorError;
use serde_json::Value;
use std::collections::BTreeMap;

/// One raw result row, columns in query order
pub type Row = Vec<Value>;

/// Result of a query: pre-formatted text plus raw rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Rendered result table for direct inclusion in a report
    pub formatted: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as column-name keyed objects
    pub fn records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: serde_json::Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(record)
            })
            .collect()
    }
}

/// Backend version and capability flags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionInfo {
    pub major_version: u32,
    pub minor_version: u32,
    /// Backend-specific capability flags such as `is_pg17_or_newer`
    pub flags: BTreeMap<String, bool>,
}

impl VersionInfo {
    pub fn new(major_version: u32, minor_version: u32) -> Self {
        VersionInfo {
            major_version,
            minor_version,
            flags: BTreeMap::new(),
        }
    }

    /// Set a capability flag
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    /// Explicit flag if the connector reported one, otherwise derived from
    /// the major version
    pub fn is_pg17_or_newer(&self) -> bool {
        self.flag("is_pg17_or_newer")
            .unwrap_or(self.major_version >= 17)
    }
}

/// Capability provider for one backend
pub trait Connector {
    /// Run a query. When `return_raw` is false, implementations may leave
    /// `rows` empty and only fill `formatted`.
    fn execute_query(
        &mut self,
        query: &str,
        params: &[Value],
        return_raw: bool,
    ) -> Result<QueryOutput, ConnectorError>;

    /// Run a non-SQL command (shell, nodetool, broker admin call)
    fn execute_command(&mut self, command: &str) -> Result<Value, ConnectorError>;

    fn version_info(&self) -> &VersionInfo;

    /// Managed-service deployment flavor
    fn is_aurora(&self) -> bool;
}
