//! Built-in check modules.
//!
//! Checks are grouped by the subsystem they inspect:
//! - Checkpoints: checkpoint and background writer activity
//! - Locks: sessions blocked on other sessions
//! - Statements: top queries from the statement statistics extension
//! - Tables: insert-heavy tables
//! - Aurora: managed-service deployment notes
//! - Indexes: unused indexes across replica nodes
//! - Summary: digest of findings gathered earlier in the run
//!
//! # Graceful Degradation
//!
//! - Missing extension or wrong deployment flavor: `[NOTE]` text and a note
//!   finding, never an error
//! - Query or command failure: propagated as [`CheckError`] so the dispatcher
//!   renders an `[ERROR]` block
//! - Malformed command output: recovered with diagnostics
//!
//! Checks never panic.
//!
//! [`CheckError`]: crate::CheckError

pub mod aurora;
pub mod checkpoints;
pub mod helpers;
pub mod indexes;
pub mod locks;
pub mod statements;
pub mod summary;
pub mod tables;

use crate::engine::registry::{ConnectorCheckFn, RawCheckFn};

/// Calling convention of a built-in check
#[derive(Clone, Copy)]
pub enum CheckStyle {
    Raw(RawCheckFn),
    Connector(ConnectorCheckFn),
}

/// One entry of the static registration table
#[derive(Clone, Copy)]
pub struct BuiltinCheck {
    pub module: &'static str,
    pub function: &'static str,
    pub description: &'static str,
    pub style: CheckStyle,
}

/// Every built-in check
pub fn builtin_checks() -> Vec<BuiltinCheck> {
    vec![
        BuiltinCheck {
            module: "postgres_checkpoints",
            function: "get_checkpoint_stats",
            description: "Checkpoint frequency and write timings",
            style: CheckStyle::Connector(checkpoints::get_checkpoint_stats),
        },
        BuiltinCheck {
            module: "postgres_locks",
            function: "get_blocking_queries",
            description: "Sessions waiting on locks held by other sessions",
            style: CheckStyle::Raw(locks::get_blocking_queries),
        },
        BuiltinCheck {
            module: "postgres_statements",
            function: "get_top_queries",
            description: "Most expensive statements by total execution time",
            style: CheckStyle::Raw(statements::get_top_queries),
        },
        BuiltinCheck {
            module: "postgres_tables",
            function: "get_insert_heavy_tables",
            description: "Tables with inserts above the configured threshold",
            style: CheckStyle::Connector(tables::get_insert_heavy_tables),
        },
        BuiltinCheck {
            module: "aurora",
            function: "get_aurora_notes",
            description: "Managed-service version and notes",
            style: CheckStyle::Connector(aurora::get_aurora_notes),
        },
        BuiltinCheck {
            module: "postgres_indexes",
            function: "get_cross_node_unused_indexes",
            description: "Indexes unused on every node and backing no constraint",
            style: CheckStyle::Connector(indexes::get_cross_node_unused_indexes),
        },
        BuiltinCheck {
            module: "report",
            function: "get_findings_summary",
            description: "Digest of findings gathered so far",
            style: CheckStyle::Raw(summary::get_findings_summary),
        },
    ]
}
