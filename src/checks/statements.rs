//! Top statements from `pg_stat_statements`.

use crate::connector::dialect::{select_variant, QueryVariant};
use crate::connector::Connector;
use crate::engine::findings::{FindingsStore, StructuredFinding};
use crate::engine::registry::{CheckOutput, CommandHelper, QueryHelper};
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde_json::json;

// The timing columns were renamed in 13.
const TOP_QUERY_VARIANTS: [QueryVariant; 2] = [
    QueryVariant {
        name: "total_time",
        min_major: 9,
        query: "SELECT calls, round(total_time::numeric, 2) AS total_ms, \
round(mean_time::numeric, 2) AS mean_ms, rows, query \
FROM pg_stat_statements ORDER BY total_time DESC",
    },
    QueryVariant {
        name: "total_exec_time",
        min_major: 13,
        query: "SELECT calls, round(total_exec_time::numeric, 2) AS total_ms, \
round(mean_exec_time::numeric, 2) AS mean_ms, rows, query \
FROM pg_stat_statements ORDER BY total_exec_time DESC",
    },
];

pub fn get_top_queries(
    cursor: &mut dyn Connector,
    settings: &Settings,
    execute_query: QueryHelper,
    _execute_command: CommandHelper,
    _findings: &FindingsStore,
) -> Result<CheckOutput, CheckError> {
    if !settings.has_pgstat() {
        let message = "pg_stat_statements is not installed; statement statistics are unavailable.";
        return Ok(CheckOutput::new(asciidoc::note_block(message))
            .with_finding("top_queries", StructuredFinding::note(message)));
    }

    let variant = select_variant(&TOP_QUERY_VARIANTS, cursor.version_info()).unwrap_or(&TOP_QUERY_VARIANTS[0]);
    let query = format!("{} LIMIT {}", variant.query, settings.row_limit());
    let output = execute_query(cursor, &query, settings)?;

    Ok(CheckOutput::new(output.formatted.clone()).with_finding(
        "top_queries",
        StructuredFinding::success(json!({
            "row_limit": settings.row_limit(),
            "rows": output.records(),
        })),
    ))
}
