//! Execution helpers handed to raw-style checks.

use crate::connector::{Connector, QueryOutput};
use crate::output::asciidoc;
use crate::{ConnectorError, Settings};
use serde_json::Value;

/// Run `query`, echoing its text ahead of the result when `show_qry` is set
pub fn execute_query(
    connector: &mut dyn Connector,
    query: &str,
    settings: &Settings,
) -> Result<QueryOutput, ConnectorError> {
    tracing::debug!(query = %query, "executing query");
    let mut output = connector.execute_query(query, &[], true)?;
    if settings.show_qry() {
        output.formatted = format!("{}\n{}", asciidoc::query_block(query), output.formatted);
    }
    Ok(output)
}

/// Run a non-SQL command
pub fn execute_command(connector: &mut dyn Connector, command: &str) -> Result<Value, ConnectorError> {
    tracing::debug!(command = %command, "executing command");
    connector.execute_command(command)
}
