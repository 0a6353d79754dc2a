//! JSON rendering of a run.

use super::OutputFormatter;
use crate::engine::runner::RunOutcome;
use serde_json::json;

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, outcome: &RunOutcome) -> String {
        let document = &outcome.document;
        let value = json!({
            "title": document.title,
            "generated_at": document.generated_at,
            "total_duration_ms": document.total_duration_ms,
            "cancelled": document.cancelled,
            "summary": document.summary(),
            "sections": document.sections,
            "findings": outcome.findings.to_json(),
        });

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        rendered.unwrap_or_else(|_| "{}".to_string())
    }
}
