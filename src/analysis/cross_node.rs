//! Cross-node unused index classification.
//!
//! Aggregates per-node index usage samples into a list of indexes that no
//! node has ever scanned and that back no constraint.
//!
//! # Graceful Degradation
//!
//! Input comes from remote nodes and is not trusted:
//! - `index_data` not an object: empty result, diagnostic recorded
//! - Primary node absent or malformed: empty result, diagnostic recorded
//! - A node's `index_usage` not a sequence: node treated as reporting no
//!   rows, diagnostic recorded
//! - Malformed row: row skipped, diagnostic recorded
//! - Unreadable `scan_count`: index counted as used, diagnostic recorded
//! - Other unreadable counters: treated as 0
//!
//! No function in this module will panic or return an error.

use crate::DataShapeError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Usage of one index on one node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexUsage {
    pub table_name: String,
    pub scan_count: i64,
    pub tuples_read: i64,
    pub tuples_fetched: i64,
    pub size: String,
}

/// An index classified as unused
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnusedIndex {
    pub index_name: String,
    /// Usage per node, keyed by node name
    pub usage_summary: BTreeMap<String, IndexUsage>,
    pub supports_constraints: bool,
}

/// One parsed `index_usage` row
#[derive(Debug, Clone)]
struct UsageRow {
    index_name: String,
    usage: IndexUsage,
    /// `scan_count` could not be read; the index must not be reported unused
    scans_unknown: bool,
}

/// Result of a cross-node analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossNodeAnalysis {
    pub unused: Vec<UnusedIndex>,
    pub nodes_examined: usize,
    pub diagnostics: Vec<DataShapeError>,
}

/// Classifies unused indexes across nodes
#[derive(Debug, Clone)]
pub struct CrossNodeIndexAnalyzer {
    primary_node: String,
}

impl CrossNodeIndexAnalyzer {
    pub fn new(primary_node: impl Into<String>) -> Self {
        CrossNodeIndexAnalyzer {
            primary_node: primary_node.into(),
        }
    }

    /// Classify unused indexes.
    ///
    /// `index_data` maps node name to `{"index_usage": [row, ...]}` where a
    /// row is `[table_name, index_name, scan_count, tuples_read,
    /// tuples_fetched, size]` or an object with those fields.
    /// `check_index_constraints` is consulted only for indexes no node has
    /// used.
    pub fn analyze<F>(&self, index_data: &Value, mut check_index_constraints: F) -> CrossNodeAnalysis
    where
        F: FnMut(&str) -> bool,
    {
        let mut analysis = CrossNodeAnalysis::default();

        let nodes = match index_data {
            Value::Object(nodes) => nodes,
            other => {
                record(&mut analysis.diagnostics, DataShapeError::new("index_data", "object", other));
                return analysis;
            }
        };

        let mut node_names: Vec<&String> = nodes.keys().collect();
        node_names.sort();

        let parsed: Vec<(&str, Vec<UsageRow>)> = node_names
            .into_iter()
            .map(|name| {
                let rows = node_rows(name, &nodes[name.as_str()], &mut analysis.diagnostics);
                (name.as_str(), rows)
            })
            .collect();
        analysis.nodes_examined = parsed.len();

        let primary_rows = match nodes.get(&self.primary_node) {
            Some(Value::Object(_)) => parsed
                .iter()
                .find(|(name, _)| *name == self.primary_node)
                .map(|(_, rows)| rows.as_slice())
                .unwrap_or(&[]),
            Some(other) => {
                let context = format!("node '{}'", self.primary_node);
                record(&mut analysis.diagnostics, DataShapeError::new(context, "object", other));
                return analysis;
            }
            None => {
                let context = format!("primary node '{}'", self.primary_node);
                record(&mut analysis.diagnostics, DataShapeError::new(context, "object", &Value::Null));
                return analysis;
            }
        };

        let mut seen = HashSet::new();
        let index_names: Vec<&str> = primary_rows
            .iter()
            .map(|row| row.index_name.as_str())
            .filter(|name| seen.insert(*name))
            .collect();

        for index_name in index_names {
            let mut used = false;
            let mut usage_summary = BTreeMap::new();

            for (node, rows) in &parsed {
                let usage = match rows.iter().find(|row| row.index_name == index_name) {
                    Some(row) => {
                        if row.scans_unknown || row.usage.scan_count > 0 {
                            used = true;
                        }
                        row.usage.clone()
                    }
                    None => IndexUsage::default(),
                };
                usage_summary.insert(node.to_string(), usage);
            }

            if !used && !check_index_constraints(index_name) {
                analysis.unused.push(UnusedIndex {
                    index_name: index_name.to_string(),
                    usage_summary,
                    supports_constraints: false,
                });
            }
        }

        analysis
    }
}

fn record(diagnostics: &mut Vec<DataShapeError>, error: DataShapeError) {
    tracing::warn!(error = %error, "malformed index usage data");
    diagnostics.push(error);
}

/// Parsed rows reported by one node; malformed input degrades to no rows
fn node_rows(node: &str, data: &Value, diagnostics: &mut Vec<DataShapeError>) -> Vec<UsageRow> {
    let usage = match data {
        Value::Object(fields) => fields.get("index_usage").unwrap_or(&Value::Null),
        Value::Null => &Value::Null,
        other => {
            record(diagnostics, DataShapeError::new(format!("node '{}'", node), "object", other));
            return Vec::new();
        }
    };

    let rows = match usage {
        Value::Array(rows) => rows,
        Value::Null => return Vec::new(),
        other => {
            let context = format!("node '{}' index_usage", node);
            record(diagnostics, DataShapeError::new(context, "array", other));
            return Vec::new();
        }
    };

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let context = format!("node '{}' index_usage[{}]", node, i);
            let parsed = parse_row(row);
            match &parsed {
                None => record(diagnostics, DataShapeError::new(context, "6-column row", row)),
                Some((parsed_row, scans)) if parsed_row.scans_unknown => {
                    let context = format!("{} scan_count", context);
                    record(diagnostics, DataShapeError::new(context, "number", scans));
                }
                Some(_) => {}
            }
            parsed.map(|(parsed_row, _)| parsed_row)
        })
        .collect()
}

/// Parsed row plus the raw `scan_count` value for diagnostics
fn parse_row(row: &Value) -> Option<(UsageRow, &Value)> {
    let (table, index, scans, read, fetched, size) = match row {
        Value::Array(cols) if cols.len() >= 6 => (&cols[0], &cols[1], &cols[2], &cols[3], &cols[4], &cols[5]),
        Value::Object(fields) => (
            fields.get("table_name")?,
            fields.get("index_name")?,
            fields.get("scan_count").unwrap_or(&Value::Null),
            fields.get("tuples_read").unwrap_or(&Value::Null),
            fields.get("tuples_fetched").unwrap_or(&Value::Null),
            fields.get("size").unwrap_or(&Value::Null),
        ),
        _ => return None,
    };

    let index_name = index.as_str()?.to_string();
    let scan_count = counter(scans);
    Some((
        UsageRow {
            index_name,
            usage: IndexUsage {
                table_name: text(table),
                scan_count: scan_count.unwrap_or(0),
                tuples_read: counter(read).unwrap_or(0),
                tuples_fetched: counter(fetched).unwrap_or(0),
                size: text(size),
            },
            scans_unknown: scan_count.is_none(),
        },
        scans,
    ))
}

/// Integer counter from a JSON number or numeric string, including decimal
/// forms such as `"12.0"`
fn counter(value: &Value) -> Option<i64> {
    let float = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Some(i);
            }
            n.as_f64()?
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Some(i);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    float.is_finite().then_some(float as i64)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
