//! Insert-heavy tables.

use super::helpers;
use crate::connector::Connector;
use crate::engine::findings::StructuredFinding;
use crate::engine::registry::CheckOutput;
use crate::{CheckError, Settings};
use serde_json::json;

pub fn insert_heavy_query(settings: &Settings) -> String {
    format!(
        "SELECT schemaname, relname, n_tup_ins, n_tup_upd, n_tup_del, n_live_tup \
FROM pg_stat_user_tables WHERE n_tup_ins >= {} ORDER BY n_tup_ins DESC LIMIT {}",
        settings.min_tup_ins_threshold(),
        settings.row_limit()
    )
}

pub fn get_insert_heavy_tables(connector: &mut dyn Connector, settings: &Settings) -> Result<CheckOutput, CheckError> {
    let query = insert_heavy_query(settings);
    let output = helpers::execute_query(connector, &query, settings)?;

    let text = if output.is_empty() {
        format!(
            "No tables with at least {} inserted tuples.\n",
            settings.min_tup_ins_threshold()
        )
    } else {
        output.formatted.clone()
    };

    Ok(CheckOutput::new(text).with_finding(
        "insert_heavy_tables",
        StructuredFinding::success(json!({
            "threshold": settings.min_tup_ins_threshold(),
            "tables": output.records(),
        })),
    ))
}
