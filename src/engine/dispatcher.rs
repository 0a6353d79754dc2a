//! Action dispatch.
//!
//! Executes one section's actions in configured order.
//!
//! # Failure isolation
//!
//! Every action runs inside its own failure boundary:
//! - Unresolved module: `[ERROR]` fragment, error finding under the module id
//! - Check returns an error: `[ERROR]` fragment, error finding under the
//!   module id unless the check already reported one
//! - Check panics: caught via `std::panic::catch_unwind`, handled like an
//!   error result
//! - Resource read failure: `[ERROR]` fragment, no finding
//!
//! Dispatch always continues with the next action. No function in this
//! module returns an error or panics on a failing check.

use crate::config::report::{Action, Condition, Section};
use crate::connector::Connector;
use crate::engine::findings::{FindingsStore, StructuredFinding};
use crate::engine::registry::ModuleRegistry;
use crate::engine::resources::ResourceReader;
use crate::output::asciidoc;
use crate::{CheckError, Settings};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// How a single action ended
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Check ran and returned normally
    Completed { duration_ms: u64 },
    /// Condition not met
    Skipped { reason: String },
    /// Lookup, check, or resource failure
    Failed { message: String, duration_ms: u64 },
    /// Header or comments text inlined
    Static,
}

/// Text produced by one action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub action: String,
    pub text: String,
    pub outcome: ActionOutcome,
}

/// Ordered fragments of one section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub title: String,
    pub fragments: Vec<Fragment>,
}

/// Decide whether a module action runs.
///
/// No condition: run. Matching condition: run. Failed comparison: run only
/// when the condition is marked as a fallback.
pub fn should_execute(condition: Option<&Condition>, settings: &Settings) -> bool {
    match condition {
        None => true,
        Some(c) => c.fallback || settings.matches(&c.variable, &c.expected_value),
    }
}

/// Executes section actions against one connector
pub struct ActionDispatcher<'a> {
    registry: &'a ModuleRegistry,
    resources: &'a dyn ResourceReader,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(registry: &'a ModuleRegistry, resources: &'a dyn ResourceReader) -> Self {
        ActionDispatcher { registry, resources }
    }

    /// Run every action in `section`, in order
    pub fn dispatch_section(
        &self,
        section: &Section,
        connector: &mut dyn Connector,
        settings: &Settings,
        findings: &mut FindingsStore,
    ) -> SectionReport {
        let mut fragments = Vec::with_capacity(section.actions.len());
        for action in &section.actions {
            fragments.push(self.dispatch_action(action, connector, settings, findings));
        }

        SectionReport {
            title: section.title.clone(),
            fragments,
        }
    }

    /// Run a single action
    pub fn dispatch_action(
        &self,
        action: &Action,
        connector: &mut dyn Connector,
        settings: &Settings,
        findings: &mut FindingsStore,
    ) -> Fragment {
        let label = action.label();
        let _span = tracing::info_span!("action", action = %label).entered();

        match action {
            Action::Module {
                module_id,
                function_id,
                condition,
            } => {
                if !should_execute(condition.as_ref(), settings) {
                    let reason = condition
                        .as_ref()
                        .map(|c| format!("{} != {}", c.variable, c.expected_value))
                        .unwrap_or_default();
                    tracing::debug!(reason = %reason, "condition not met, skipping");
                    return Fragment {
                        action: label,
                        text: String::new(),
                        outcome: ActionOutcome::Skipped { reason },
                    };
                }
                self.run_module(label, module_id, function_id, connector, settings, findings)
            }
            Action::Header { file } => self.run_static(label, file, None),
            Action::Comments { file, display_title } => {
                self.run_static(label, file, display_title.as_deref())
            }
        }
    }

    fn run_module(
        &self,
        label: String,
        module_id: &str,
        function_id: &str,
        connector: &mut dyn Connector,
        settings: &Settings,
        findings: &mut FindingsStore,
    ) -> Fragment {
        let start = Instant::now();

        let module = match self.registry.resolve(module_id, function_id) {
            Ok(module) => module,
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "module lookup failed");
                findings.insert(module_id, StructuredFinding::error(message.clone()));
                return failed_fragment(label, message, elapsed_ms(start));
            }
        };

        let result = {
            let store: &FindingsStore = findings;
            panic::catch_unwind(AssertUnwindSafe(|| module.invoke(connector, settings, store)))
        };
        let duration_ms = elapsed_ms(start);

        match result {
            Ok(Ok(output)) => {
                findings.merge(output.findings);
                Fragment {
                    action: label,
                    text: output.text,
                    outcome: ActionOutcome::Completed { duration_ms },
                }
            }
            Ok(Err(error)) => {
                let message = error.to_string();
                tracing::warn!(error = %message, "check failed");
                let reported_own = match error {
                    CheckError::Reported { findings: reported, .. } => {
                        let has_own = reported.contains_key(module_id);
                        findings.merge(reported);
                        has_own
                    }
                    _ => false,
                };
                if !reported_own {
                    findings.insert(module_id, StructuredFinding::error(message.clone()));
                }
                failed_fragment(label, message, duration_ms)
            }
            Err(payload) => {
                let message = format!("check panicked: {}", panic_message(&*payload));
                tracing::warn!(error = %message, "check panicked");
                findings.insert(module_id, StructuredFinding::error(message.clone()));
                failed_fragment(label, message, duration_ms)
            }
        }
    }

    fn run_static(&self, label: String, file: &str, display_title: Option<&str>) -> Fragment {
        let start = Instant::now();

        match self.resources.read(file) {
            Ok(content) => {
                let text = match display_title {
                    Some(title) => format!("{}\n{}", asciidoc::heading(3, title), content),
                    None => content,
                };
                Fragment {
                    action: label,
                    text,
                    outcome: ActionOutcome::Static,
                }
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "resource read failed");
                failed_fragment(label, message, elapsed_ms(start))
            }
        }
    }
}

fn failed_fragment(action: String, message: String, duration_ms: u64) -> Fragment {
    let text = asciidoc::error_block(&format!("Action `{}` failed: {}", action, message));
    Fragment {
        action,
        text,
        outcome: ActionOutcome::Failed {
            message,
            duration_ms,
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
