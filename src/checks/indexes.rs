//! Unused indexes across the primary and its replicas.
//!
//! Index usage is collected per node by the connector's
//! `collect_index_usage` command, which returns
//! `{node: {"index_usage": [row, ...]}}`. An index is reported only when
//! no node has scanned it and it backs no constraint.

use super::helpers;
use crate::analysis::CrossNodeIndexAnalyzer;
use crate::connector::Connector;
use crate::engine::findings::StructuredFinding;
use crate::engine::registry::CheckOutput;
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde_json::json;

pub const INDEX_USAGE_COMMAND: &str = "collect_index_usage";

pub const CONSTRAINT_QUERY: &str = "SELECT c.conname FROM pg_catalog.pg_constraint c \
JOIN pg_catalog.pg_class i ON i.oid = c.conindid WHERE i.relname = $1";

const COLUMNS: [&str; 7] = ["Index", "Node", "Table", "Scans", "Tuples read", "Tuples fetched", "Size"];

pub fn get_cross_node_unused_indexes(connector: &mut dyn Connector, settings: &Settings) -> Result<CheckOutput, CheckError> {
    let index_data = helpers::execute_command(connector, INDEX_USAGE_COMMAND)?;

    let analyzer = CrossNodeIndexAnalyzer::new(settings.primary_node());
    let analysis = analyzer.analyze(&index_data, |index_name| supports_constraints(&mut *connector, index_name));

    let mut text = format!(
        "Examined {} node(s); {} unused index(es) found.\n",
        analysis.nodes_examined,
        analysis.unused.len()
    );

    if !analysis.unused.is_empty() {
        let rows: Vec<Vec<String>> = analysis
            .unused
            .iter()
            .flat_map(|unused| {
                unused.usage_summary.iter().map(move |(node, usage)| {
                    vec![
                        unused.index_name.clone(),
                        node.clone(),
                        usage.table_name.clone(),
                        usage.scan_count.to_string(),
                        usage.tuples_read.to_string(),
                        usage.tuples_fetched.to_string(),
                        usage.size.clone(),
                    ]
                })
            })
            .collect();
        text.push('\n');
        text.push_str(&asciidoc::table(&COLUMNS, &rows));
    }

    let diagnostics: Vec<String> = analysis.diagnostics.iter().map(ToString::to_string).collect();
    if !diagnostics.is_empty() {
        text.push('\n');
        text.push_str(&asciidoc::note_block(&format!(
            "Some index usage data was malformed and ignored:\n\n{}",
            diagnostics
                .iter()
                .map(|d| format!("* {}", d))
                .collect::<Vec<_>>()
                .join("\n")
        )));
    }

    Ok(CheckOutput::new(text).with_finding(
        "cross_node_unused_indexes",
        StructuredFinding::success(json!({
            "primary_node": settings.primary_node(),
            "nodes_examined": analysis.nodes_examined,
            "unused": analysis.unused,
            "diagnostics": diagnostics,
        })),
    ))
}

/// A failed lookup counts as backing a constraint so nothing is reported
/// unused without evidence
fn supports_constraints(connector: &mut dyn Connector, index_name: &str) -> bool {
    match connector.execute_query(CONSTRAINT_QUERY, &[json!(index_name)], true) {
        Ok(output) => !output.is_empty(),
        Err(e) => {
            tracing::warn!(index = index_name, error = %e, "constraint lookup failed");
            true
        }
    }
}
