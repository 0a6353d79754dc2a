//! Blocked sessions.

use crate::connector::dialect::{select_variant, QueryVariant};
use crate::connector::{Connector, VersionInfo};
use crate::engine::findings::{FindingsStore, StructuredFinding};
use crate::engine::registry::{CheckOutput, CommandHelper, QueryHelper};
use crate::{CheckError, Settings};
use serde_json::json;

/// Pre-10 servers lack `pg_blocking_pids`
pub const LEGACY_BLOCKING: QueryVariant = QueryVariant {
    name: "legacy_blocking",
    min_major: 9,
    query: "SELECT blocked.pid AS blocked_pid, \
blocked.usename AS blocked_user, \
blocking.pid AS blocking_pid, \
blocking.usename AS blocking_user, \
blocked.query AS blocked_statement \
FROM pg_catalog.pg_locks blocked_locks \
JOIN pg_catalog.pg_stat_activity blocked ON blocked.pid = blocked_locks.pid \
JOIN pg_catalog.pg_locks blocking_locks ON blocking_locks.locktype = blocked_locks.locktype \
AND blocking_locks.relation IS NOT DISTINCT FROM blocked_locks.relation \
AND blocking_locks.transactionid IS NOT DISTINCT FROM blocked_locks.transactionid \
AND blocking_locks.pid != blocked_locks.pid \
JOIN pg_catalog.pg_stat_activity blocking ON blocking.pid = blocking_locks.pid \
WHERE NOT blocked_locks.granted",
};

pub const LOCK_JOIN_BLOCKING: QueryVariant = QueryVariant {
    name: "lock_join",
    min_major: 10,
    query: "SELECT blocked.pid AS blocked_pid, \
blocked.usename AS blocked_user, \
blocking.pid AS blocking_pid, \
blocking.usename AS blocking_user, \
blocked_locks.mode AS blocked_mode, \
blocked.wait_event_type, \
blocked.query AS blocked_statement \
FROM pg_catalog.pg_stat_activity blocked \
JOIN pg_catalog.pg_locks blocked_locks ON blocked_locks.pid = blocked.pid AND NOT blocked_locks.granted \
JOIN pg_catalog.pg_stat_activity blocking ON blocking.pid = ANY(pg_blocking_pids(blocked.pid))",
};

static BLOCKING_VARIANTS: [QueryVariant; 2] = [LEGACY_BLOCKING, LOCK_JOIN_BLOCKING];

pub fn blocking_query_variant(version: &VersionInfo) -> &'static QueryVariant {
    select_variant(&BLOCKING_VARIANTS, version).unwrap_or(&BLOCKING_VARIANTS[0])
}

pub fn get_blocking_queries(
    cursor: &mut dyn Connector,
    settings: &Settings,
    execute_query: QueryHelper,
    _execute_command: CommandHelper,
    _findings: &FindingsStore,
) -> Result<CheckOutput, CheckError> {
    let variant = blocking_query_variant(cursor.version_info());
    tracing::debug!(variant = variant.name, "selected blocking query variant");

    let output = execute_query(cursor, variant.query, settings)?;
    let text = if output.is_empty() {
        "No blocking sessions detected.\n".to_string()
    } else {
        output.formatted.clone()
    };

    Ok(CheckOutput::new(text).with_finding(
        "blocking_queries",
        StructuredFinding::success(json!({
            "variant": variant.name,
            "blocked_sessions": output.rows.len(),
            "rows": output.records(),
        })),
    ))
}
