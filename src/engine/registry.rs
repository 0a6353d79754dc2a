//! Check module registry.
//!
//! Maps `(module, function)` identifiers to invocable checks. Two calling
//! conventions exist among check modules:
//! - raw: `(cursor, settings, execute_query, execute_command, findings)`
//! - connector: `(connector, settings)`
//!
//! Both are wrapped into one [`CheckFn`] when they are registered, so the
//! dispatcher only ever sees `(connector, settings, findings)`. Registration
//! happens once, before any run, from an explicit table.

use crate::checks::{self, helpers, BuiltinCheck, CheckStyle};
use crate::connector::{Connector, QueryOutput};
use crate::engine::findings::{Findings, FindingsStore, StructuredFinding};
use crate::{CheckError, ConnectorError, LookupError, Settings};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Text and structured output of one check invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutput {
    pub text: String,
    pub findings: Findings,
}

impl CheckOutput {
    pub fn new(text: impl Into<String>) -> Self {
        CheckOutput {
            text: text.into(),
            findings: Findings::new(),
        }
    }

    /// Attach a structured finding under `key`
    pub fn with_finding(mut self, key: impl Into<String>, finding: StructuredFinding) -> Self {
        self.findings.insert(key.into(), finding);
        self
    }
}

/// Normalized check contract
pub type CheckFn = Box<
    dyn Fn(&mut dyn Connector, &Settings, &FindingsStore) -> Result<CheckOutput, CheckError>
        + Send
        + Sync,
>;

/// Query helper handed to raw-style checks
pub type QueryHelper = fn(&mut dyn Connector, &str, &Settings) -> Result<QueryOutput, ConnectorError>;

/// Command helper handed to raw-style checks
pub type CommandHelper = fn(&mut dyn Connector, &str) -> Result<Value, ConnectorError>;

/// Raw-style check signature
pub type RawCheckFn = fn(
    &mut dyn Connector,
    &Settings,
    QueryHelper,
    CommandHelper,
    &FindingsStore,
) -> Result<CheckOutput, CheckError>;

/// Connector-style check signature
pub type ConnectorCheckFn = fn(&mut dyn Connector, &Settings) -> Result<CheckOutput, CheckError>;

/// Symbolic check identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey {
    pub module: String,
    pub function: String,
}

impl ModuleKey {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        ModuleKey {
            module: module.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.function)
    }
}

/// A registered check with its normalized execution function
pub struct RegisteredModule {
    pub key: ModuleKey,
    pub description: String,
    check_fn: CheckFn,
}

impl RegisteredModule {
    /// Invoke the check
    pub fn invoke(
        &self,
        connector: &mut dyn Connector,
        settings: &Settings,
        findings: &FindingsStore,
    ) -> Result<CheckOutput, CheckError> {
        (self.check_fn)(connector, settings, findings)
    }
}

impl fmt::Debug for RegisteredModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredModule")
            .field("key", &self.key)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Registry of invocable checks
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<ModuleKey, RegisteredModule>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    /// Create a registry holding every built-in check
    pub fn with_builtin_checks() -> Self {
        let mut registry = ModuleRegistry::new();
        registry.register_builtins(checks::builtin_checks());
        registry
    }

    /// Register entries from a static check table
    pub fn register_builtins(&mut self, table: Vec<BuiltinCheck>) {
        for entry in table {
            match entry.style {
                CheckStyle::Raw(check) => {
                    self.register_raw_check(entry.module, entry.function, entry.description, check)
                }
                CheckStyle::Connector(check) => self.register_connector_check(
                    entry.module,
                    entry.function,
                    entry.description,
                    check,
                ),
            }
        }
    }

    /// Register an already-normalized check. A later registration under the
    /// same key replaces the earlier one.
    pub fn register<F>(&mut self, module: &str, function: &str, description: &str, check: F)
    where
        F: Fn(&mut dyn Connector, &Settings, &FindingsStore) -> Result<CheckOutput, CheckError>
            + Send
            + Sync
            + 'static,
    {
        let key = ModuleKey::new(module, function);
        if self.modules.contains_key(&key) {
            tracing::warn!(module = %key, "replacing previously registered check");
        }
        self.modules.insert(
            key.clone(),
            RegisteredModule {
                key,
                description: description.to_string(),
                check_fn: Box::new(check),
            },
        );
    }

    /// Register a connector-style check `(connector, settings)`
    pub fn register_connector_check<F>(&mut self, module: &str, function: &str, description: &str, check: F)
    where
        F: Fn(&mut dyn Connector, &Settings) -> Result<CheckOutput, CheckError> + Send + Sync + 'static,
    {
        self.register(
            module,
            function,
            description,
            move |connector: &mut dyn Connector, settings: &Settings, _findings: &FindingsStore| {
                check(connector, settings)
            },
        );
    }

    /// Register a raw-style check `(cursor, settings, execute_query,
    /// execute_command, findings)`
    pub fn register_raw_check<F>(&mut self, module: &str, function: &str, description: &str, check: F)
    where
        F: Fn(&mut dyn Connector, &Settings, QueryHelper, CommandHelper, &FindingsStore) -> Result<CheckOutput, CheckError>
            + Send
            + Sync
            + 'static,
    {
        self.register(
            module,
            function,
            description,
            move |connector: &mut dyn Connector, settings: &Settings, findings: &FindingsStore| {
                check(
                    connector,
                    settings,
                    helpers::execute_query,
                    helpers::execute_command,
                    findings,
                )
            },
        );
    }

    /// Resolve a symbolic identifier
    pub fn resolve(&self, module: &str, function: &str) -> Result<&RegisteredModule, LookupError> {
        self.modules
            .get(&ModuleKey::new(module, function))
            .ok_or_else(|| LookupError {
                module: module.to_string(),
                function: function.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Registered identifiers in sorted order
    pub fn keys(&self) -> Vec<&ModuleKey> {
        let mut keys: Vec<_> = self.modules.keys().collect();
        keys.sort();
        keys
    }
}
