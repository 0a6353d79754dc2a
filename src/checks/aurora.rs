//! Aurora deployment notes.

use super::helpers;
use crate::connector::Connector;
use crate::engine::findings::StructuredFinding;
use crate::engine::registry::CheckOutput;
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde_json::json;

pub const AURORA_VERSION_QUERY: &str = "SELECT aurora_version() AS aurora_version, version() AS engine_version";

/// The deployment counts as Aurora when the connector detects it or the
/// `is_aurora` setting declares it
pub fn get_aurora_notes(connector: &mut dyn Connector, settings: &Settings) -> Result<CheckOutput, CheckError> {
    if !connector.is_aurora() && !settings.is_aurora() {
        let message = "Not an Aurora deployment; managed-service notes do not apply.";
        return Ok(CheckOutput::new(asciidoc::note_block(message))
            .with_finding("aurora", StructuredFinding::note(message)));
    }

    let output = helpers::execute_query(connector, AURORA_VERSION_QUERY, settings)?;
    let mut text = output.formatted.clone();
    text.push('\n');
    text.push_str(&asciidoc::note_block(
        "Storage, checkpointing and replication are managed by the service. \
Checkpoint and WAL statistics may not reflect host-level I/O.",
    ));

    Ok(CheckOutput::new(text).with_finding(
        "aurora",
        StructuredFinding::success(json!({ "rows": output.records() })),
    ))
}
