//! Checkpoint activity.
//!
//! PostgreSQL 17 moved checkpoint counters out of `pg_stat_bgwriter` into
//! `pg_stat_checkpointer` and renamed them.

use super::helpers;
use crate::connector::{Connector, VersionInfo};
use crate::engine::findings::StructuredFinding;
use crate::engine::registry::CheckOutput;
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde_json::{json, Value};

pub const CHECKPOINTER_QUERY: &str = "SELECT num_timed AS checkpoints_timed, \
num_requested AS checkpoints_req, \
num_timed + num_requested AS total_checkpoints, \
write_time AS checkpoint_write_time, \
sync_time AS checkpoint_sync_time, \
buffers_written AS buffers_checkpoint \
FROM pg_stat_checkpointer";

pub const BGWRITER_QUERY: &str = "SELECT checkpoints_timed, \
checkpoints_req, \
checkpoints_timed + checkpoints_req AS total_checkpoints, \
checkpoint_write_time, \
checkpoint_sync_time, \
buffers_checkpoint \
FROM pg_stat_bgwriter";

/// Share of requested checkpoints above which a note is emitted
const REQUESTED_RATIO_WARN: f64 = 0.5;

/// Source view and query for `version`
pub fn checkpoint_query(version: &VersionInfo) -> (&'static str, &'static str) {
    if version.is_pg17_or_newer() {
        ("pg_stat_checkpointer", CHECKPOINTER_QUERY)
    } else {
        ("pg_stat_bgwriter", BGWRITER_QUERY)
    }
}

pub fn get_checkpoint_stats(connector: &mut dyn Connector, settings: &Settings) -> Result<CheckOutput, CheckError> {
    let (view, query) = checkpoint_query(connector.version_info());
    let output = helpers::execute_query(connector, query, settings)?;

    let mut text = output.formatted.clone();
    if let Some(row) = output.rows.first() {
        let requested = number(row.get(1));
        let total = number(row.get(2));
        if total > 0.0 && requested / total > REQUESTED_RATIO_WARN {
            text.push('\n');
            text.push_str(&asciidoc::note_block(&format!(
                "{:.0}% of checkpoints were requested rather than timed. Consider raising max_wal_size.",
                requested / total * 100.0
            )));
        }
    }

    Ok(CheckOutput::new(text).with_finding(
        "checkpoint_stats",
        StructuredFinding::success(json!({
            "source_view": view,
            "rows": output.records(),
        })),
    ))
}

fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
