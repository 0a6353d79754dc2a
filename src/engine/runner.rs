//! Report run execution.
//!
//! Walks the configured sections strictly in order, handing each to the
//! [`ActionDispatcher`], and collects the ordered section reports and the
//! final findings store.
//!
//! Cancellation is checked only between sections. An action that has begun
//! always finishes, so each action's text and findings land together or not
//! at all.

use crate::config::report::ReportConfiguration;
use crate::connector::Connector;
use crate::engine::assembler::{ReportAssembler, ReportDocument};
use crate::engine::dispatcher::ActionDispatcher;
use crate::engine::findings::FindingsStore;
use crate::engine::registry::ModuleRegistry;
use crate::engine::resources::ResourceReader;
use crate::Settings;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Shared cancellation request, honored at section boundaries
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Document and findings produced by one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub document: ReportDocument,
    pub findings: FindingsStore,
}

impl RunOutcome {
    /// Render the document as AsciiDoc
    pub fn render(&self) -> String {
        ReportAssembler::new().assemble(&self.document)
    }
}

/// Executes a report configuration
pub struct ReportRunner<'a> {
    dispatcher: ActionDispatcher<'a>,
    cancel: Option<CancelFlag>,
    title: Option<String>,
}

impl<'a> ReportRunner<'a> {
    pub fn new(registry: &'a ModuleRegistry, resources: &'a dyn ResourceReader) -> Self {
        ReportRunner {
            dispatcher: ActionDispatcher::new(registry, resources),
            cancel: None,
            title: None,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Run every section in order against `connector`
    pub fn run(
        &self,
        configuration: &ReportConfiguration,
        connector: &mut dyn Connector,
        settings: &Settings,
    ) -> RunOutcome {
        let start = Instant::now();
        let mut findings = FindingsStore::new();
        let mut sections = Vec::with_capacity(configuration.sections.len());
        let mut cancelled = false;

        tracing::info!(
            sections = configuration.sections.len(),
            actions = configuration.action_count(),
            "starting report run"
        );

        for section in &configuration.sections {
            if self.is_cancelled() {
                tracing::warn!(
                    completed = sections.len(),
                    remaining = configuration.sections.len() - sections.len(),
                    "report run cancelled"
                );
                cancelled = true;
                break;
            }

            let _span = tracing::info_span!("section", title = %section.title).entered();
            sections.push(
                self.dispatcher
                    .dispatch_section(section, connector, settings, &mut findings),
            );
        }

        let document = ReportDocument {
            title: self.title.clone(),
            generated_at: unix_timestamp(),
            total_duration_ms: start.elapsed().as_millis() as u64,
            cancelled,
            sections,
        };

        let summary = document.summary();
        tracing::info!(
            completed = summary.completed,
            skipped = summary.skipped,
            failed = summary.failed,
            findings = findings.len(),
            "report run finished"
        );

        RunOutcome { document, findings }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map(CancelFlag::is_cancelled)
            .unwrap_or(false)
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
