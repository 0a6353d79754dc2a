//! Digest of findings recorded earlier in the run.

use crate::connector::Connector;
use crate::engine::findings::{FindingStatus, FindingsStore, StructuredFinding};
use crate::engine::registry::{CheckOutput, CommandHelper, QueryHelper};
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde_json::json;

const SUMMARY_KEY: &str = "findings_summary";

pub fn get_findings_summary(
    _cursor: &mut dyn Connector,
    _settings: &Settings,
    _execute_query: QueryHelper,
    _execute_command: CommandHelper,
    findings: &FindingsStore,
) -> Result<CheckOutput, CheckError> {
    let entries: Vec<_> = findings.iter().filter(|(key, _)| *key != SUMMARY_KEY).collect();

    if entries.is_empty() {
        let message = "No findings were recorded before this section.";
        return Ok(CheckOutput::new(asciidoc::note_block(message))
            .with_finding(SUMMARY_KEY, StructuredFinding::note(message)));
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|(key, finding)| {
            let status = match finding.status {
                FindingStatus::Success => "success",
                FindingStatus::Error => "error",
            };
            vec![
                key.to_string(),
                status.to_string(),
                finding.details.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let errors: Vec<&str> = entries
        .iter()
        .filter(|(_, finding)| finding.is_error())
        .map(|(key, _)| *key)
        .collect();

    let mut text = asciidoc::table(&["Check", "Status", "Details"], &rows);
    if !errors.is_empty() {
        text.push('\n');
        text.push_str(&asciidoc::note_block(&format!(
            "{} of {} checks reported errors.",
            errors.len(),
            entries.len()
        )));
    }

    Ok(CheckOutput::new(text).with_finding(
        SUMMARY_KEY,
        StructuredFinding::success(json!({
            "checked": entries.len(),
            "errors": errors,
        })),
    ))
}
