//! Output formatting for report runs.
//!
//! Provides the AsciiDoc document (see [`ReportAssembler`]) and a JSON
//! rendering that also carries the findings store.
//!
//! All formatters produce valid output for any run, including empty and
//! cancelled runs.

pub mod asciidoc;
pub mod json;

use crate::engine::assembler::ReportAssembler;
use crate::engine::runner::RunOutcome;

pub use json::JsonFormatter;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a run outcome into a string
    fn format(&self, outcome: &RunOutcome) -> String;
}

/// Output format selection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputFormat {
    /// AsciiDoc report document
    #[default]
    AsciiDoc,
    /// Machine-readable JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "adoc" | "asciidoc" => Ok(OutputFormat::AsciiDoc),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown output format: '{}'. Valid formats: asciidoc, json",
                s
            )),
        }
    }
}

/// Get a formatter for `format`
pub fn get_formatter(format: &OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::AsciiDoc => Box::new(ReportAssembler::new()),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
