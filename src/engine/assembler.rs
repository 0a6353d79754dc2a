//! Report assembly.
//!
//! Concatenates section reports into the final document. Fragments appear
//! exactly in configured order; skipped actions contribute nothing.

use crate::engine::dispatcher::{ActionOutcome, Fragment, SectionReport};
use crate::engine::runner::RunOutcome;
use crate::output::{asciidoc, OutputFormatter};
use crate::version;
use serde::Serialize;

/// Per-outcome action counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub completed: u32,
    pub skipped: u32,
    pub failed: u32,
    pub static_text: u32,
    pub total: u32,
    pub total_duration_ms: u64,
}

/// Ordered output of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: Option<String>,
    pub generated_at: u64,
    pub total_duration_ms: u64,
    pub cancelled: bool,
    pub sections: Vec<SectionReport>,
}

impl ReportDocument {
    /// All fragments in document order
    pub fn fragments(&self) -> impl Iterator<Item = &Fragment> {
        self.sections.iter().flat_map(|s| s.fragments.iter())
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for fragment in self.fragments() {
            summary.total += 1;

            match &fragment.outcome {
                ActionOutcome::Completed { duration_ms } => {
                    summary.completed += 1;
                    summary.total_duration_ms += duration_ms;
                }
                ActionOutcome::Failed { duration_ms, .. } => {
                    summary.failed += 1;
                    summary.total_duration_ms += duration_ms;
                }
                ActionOutcome::Skipped { .. } => summary.skipped += 1,
                ActionOutcome::Static => summary.static_text += 1,
            }
        }

        summary
    }

    /// Labels of failed actions, in document order
    pub fn failed_actions(&self) -> Vec<&str> {
        self.fragments()
            .filter(|f| matches!(f.outcome, ActionOutcome::Failed { .. }))
            .map(|f| f.action.as_str())
            .collect()
    }
}

/// Renders a [`ReportDocument`] as AsciiDoc
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    preamble: bool,
}

impl ReportAssembler {
    pub fn new() -> Self {
        ReportAssembler { preamble: true }
    }

    /// Omit the title and generator lines
    pub fn without_preamble(mut self) -> Self {
        self.preamble = false;
        self
    }

    /// Concatenate every fragment, in order, under its section heading.
    ///
    /// The output never embeds wall-clock time, so identical runs render
    /// identically.
    pub fn assemble(&self, document: &ReportDocument) -> String {
        let mut output = String::new();

        if self.preamble {
            if let Some(ref title) = document.title {
                output.push_str(&asciidoc::heading(1, title));
            }
            output.push_str(&format!(
                ":generator: healthcheck-report {}\n\n",
                version::get_build_info().version
            ));
        }

        for section in &document.sections {
            if !section.title.is_empty() {
                output.push_str(&asciidoc::heading(2, &section.title));
                output.push('\n');
            }

            for fragment in &section.fragments {
                if fragment.text.is_empty() {
                    continue;
                }
                output.push_str(&fragment.text);
                if !fragment.text.ends_with('\n') {
                    output.push('\n');
                }
                output.push('\n');
            }
        }

        if document.cancelled {
            output.push_str(&asciidoc::note_block(
                "Report run was cancelled; remaining sections were not executed.",
            ));
        }

        output
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for ReportAssembler {
    fn format(&self, outcome: &RunOutcome) -> String {
        self.assemble(&outcome.document)
    }
}
