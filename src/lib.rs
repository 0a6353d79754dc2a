//! healthcheck-report library
//!
//! Plugin-based health-check report orchestration for database, cache, and
//! broker backends.
//!
//! A report configuration enumerates ordered sections of actions. Each action
//! either calls a registered check module against a backend [`Connector`] or
//! inlines a static text resource. The engine:
//! - Loads and validates the configuration up front (the only fatal step)
//! - Dispatches actions strictly in configured order
//! - Evaluates per-action conditions against read-only [`Settings`]
//! - Isolates every per-action failure into a marked `[ERROR]` fragment
//! - Accumulates machine-readable results in a run-scoped [`FindingsStore`]
//! - Assembles the ordered fragments into one document
//!
//! # Example
//!
//! ```no_run
//! use healthcheck_report::{run_report, RunOptions, Settings};
//! # fn connector() -> Box<dyn healthcheck_report::Connector> { unimplemented!() }
//!
//! let settings = Settings::load("settings.toml").expect("Invalid settings");
//! let mut connector = connector();
//! let outcome = run_report("report.json", connector.as_mut(), &settings, RunOptions::default())
//!     .expect("Report configuration is invalid");
//! println!("{}", outcome.render());
//! ```

pub mod analysis;
pub mod checks;
pub mod config;
pub mod connector;
pub mod engine;
pub mod output;
pub mod telemetry;
pub mod version;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use config::report::{Action, Condition, ConfigLoader, ReportConfiguration, Section};
pub use config::settings::Settings;
pub use connector::{Connector, QueryOutput, VersionInfo};
pub use engine::findings::{FindingStatus, Findings, FindingsStore, StructuredFinding};
pub use engine::registry::{CheckOutput, ModuleKey, ModuleRegistry};
pub use engine::runner::{CancelFlag, ReportRunner, RunOutcome};

/// Malformed report configuration. Fatal: a run never starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Cannot read report configuration {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid report configuration: {0}")]
    Parse(String),

    #[error("Section {section} ('{title}') has no actions field")]
    MissingActions { section: usize, title: String },

    #[error("Section {section}, action {action}: '{action_type}' action requires field '{field}'")]
    MissingField {
        section: usize,
        action: usize,
        action_type: String,
        field: &'static str,
    },

    #[error("Section {section}, action {action}: unknown action type '{action_type}'")]
    UnknownActionType {
        section: usize,
        action: usize,
        action_type: String,
    },

    #[error("Section {section}, action {action}: condition requires field '{field}'")]
    InvalidCondition {
        section: usize,
        action: usize,
        field: &'static str,
    },
}

/// No check is registered under a `(module, function)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("No check registered for {module}.{function}")]
pub struct LookupError {
    pub module: String,
    pub function: String,
}

/// Query or command execution failure reported by a connector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Command '{command}' failed: {message}")]
    Command { command: String, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// A collaborator returned a value of the wrong shape.
///
/// Never fatal: callers substitute an empty sequence and keep the error as a
/// diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: expected {expected}, found {found}")]
pub struct DataShapeError {
    pub context: String,
    pub expected: &'static str,
    pub found: String,
}

impl DataShapeError {
    pub fn new(context: impl Into<String>, expected: &'static str, found: &serde_json::Value) -> Self {
        DataShapeError {
            context: context.into(),
            expected,
            found: json_kind(found).to_string(),
        }
    }
}

/// Short name of a JSON value's kind, used in diagnostics.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Failure of a single check invocation.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The check failed but already produced findings of its own.
    #[error("{message}")]
    Reported { message: String, findings: Findings },
}

/// Settings file could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Cannot read settings {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid settings {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported settings format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// A static text resource (header or comments) could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot read resource {path}: {message}")]
pub struct ResourceError {
    pub path: String,
    pub message: String,
}

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Options for a report run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Directory that `header`/`comments` file paths are resolved against.
    /// Defaults to the configuration file's directory.
    pub resource_dir: Option<PathBuf>,
    /// Document title rendered in the preamble.
    pub title: Option<String>,
    /// Cancellation flag, honored between sections.
    pub cancel: Option<CancelFlag>,
}

/// Run a report.
///
/// Loads the configuration at `config_path`, registers the built-in checks,
/// and executes every section against `connector`. Only configuration errors
/// are returned; every per-action failure is rendered inline.
///
/// # Example
///
/// ```no_run
/// use healthcheck_report::{run_report, RunOptions, Settings};
/// # fn connector() -> Box<dyn healthcheck_report::Connector> { unimplemented!() }
///
/// let settings = Settings::from_pairs([("show_qry", true.into())]);
/// let mut connector = connector();
/// match run_report("report.json", connector.as_mut(), &settings, RunOptions::default()) {
///     Ok(outcome) => {
///         let summary = outcome.document.summary();
///         println!("Executed: {}, Failed: {}", summary.completed, summary.failed);
///     }
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_report(
    config_path: impl AsRef<Path>,
    connector: &mut dyn Connector,
    settings: &Settings,
    options: RunOptions,
) -> Result<RunOutcome, ReportError> {
    let config_path = config_path.as_ref();
    let configuration = ConfigLoader::from_path(config_path)?;

    let registry = ModuleRegistry::with_builtin_checks();
    for key in configuration.unresolved_modules(&registry) {
        tracing::warn!(module = %key, "configured module has no registered check");
    }

    let resource_dir = options.resource_dir.clone().unwrap_or_else(|| {
        config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    });
    let reader = engine::resources::FsResourceReader::new(resource_dir);

    let mut runner = ReportRunner::new(&registry, &reader);
    if let Some(cancel) = options.cancel {
        runner = runner.with_cancel_flag(cancel);
    }
    if let Some(title) = options.title {
        runner = runner.with_title(title);
    }

    Ok(runner.run(&configuration, connector, settings))
}
