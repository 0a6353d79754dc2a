//! Report configuration loading.
//!
//! A configuration is a JSON array of sections, each with an ordered list of
//! actions. Loading is all-or-nothing: either every section and action is
//! valid or a [`ConfigError`] is returned and no run starts.

use crate::engine::registry::{ModuleKey, ModuleRegistry};
use crate::ConfigError;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

/// Execution condition evaluated against settings
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub variable: String,
    pub expected_value: Value,
    /// Run as the default path even when the comparison fails
    pub fallback: bool,
}

/// One configured unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Module {
        module_id: String,
        function_id: String,
        condition: Option<Condition>,
    },
    Header {
        file: String,
    },
    Comments {
        file: String,
        display_title: Option<String>,
    },
}

impl Action {
    /// Short label used in logs and report metadata
    pub fn label(&self) -> String {
        match self {
            Action::Module {
                module_id,
                function_id,
                ..
            } => format!("{}.{}", module_id, function_id),
            Action::Header { file } => format!("header:{}", file),
            Action::Comments { file, .. } => format!("comments:{}", file),
        }
    }
}

/// Named, ordered group of actions
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub actions: Vec<Action>,
}

/// Ordered sections of a report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportConfiguration {
    pub sections: Vec<Section>,
}

impl ReportConfiguration {
    /// Total number of actions across all sections
    pub fn action_count(&self) -> usize {
        self.sections.iter().map(|s| s.actions.len()).sum()
    }

    /// Module actions with no registered check, in configuration order
    pub fn unresolved_modules(&self, registry: &ModuleRegistry) -> Vec<ModuleKey> {
        self.sections
            .iter()
            .flat_map(|section| section.actions.iter())
            .filter_map(|action| match action {
                Action::Module {
                    module_id,
                    function_id,
                    ..
                } if registry.resolve(module_id, function_id).is_err() => {
                    Some(ModuleKey::new(module_id.as_str(), function_id.as_str()))
                }
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    actions: Option<Vec<RawAction>>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    action_type: String,
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    display_title: Option<String>,
    #[serde(default)]
    condition: Option<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    #[serde(default)]
    var: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    fallback: Option<bool>,
}

impl FromStr for ReportConfiguration {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigLoader::parse(s)
    }
}

/// Parses report configuration resources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read and parse the configuration file at `path`
    pub fn from_path(path: impl AsRef<Path>) -> Result<ReportConfiguration, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse a configuration from JSON text
    pub fn parse(content: &str) -> Result<ReportConfiguration, ConfigError> {
        let raw: Vec<RawSection> =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let sections = raw
            .into_iter()
            .enumerate()
            .map(|(index, section)| Self::convert_section(index, section))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(sections = sections.len(), "loaded report configuration");
        Ok(ReportConfiguration { sections })
    }

    fn convert_section(index: usize, raw: RawSection) -> Result<Section, ConfigError> {
        let title = raw.title.unwrap_or_default();
        let raw_actions = raw.actions.ok_or_else(|| ConfigError::MissingActions {
            section: index,
            title: title.clone(),
        })?;

        let actions = raw_actions
            .into_iter()
            .enumerate()
            .map(|(action_index, action)| Self::convert_action(index, action_index, action))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Section { title, actions })
    }

    fn convert_action(section: usize, action: usize, raw: RawAction) -> Result<Action, ConfigError> {
        let missing = |field: &'static str| ConfigError::MissingField {
            section,
            action,
            action_type: raw.action_type.clone(),
            field,
        };

        match raw.action_type.as_str() {
            "module" => {
                let module_id = raw.module.clone().ok_or_else(|| missing("module"))?;
                let function_id = raw.function.clone().ok_or_else(|| missing("function"))?;
                let condition = raw
                    .condition
                    .map(|c| Self::convert_condition(section, action, c))
                    .transpose()?;
                Ok(Action::Module {
                    module_id,
                    function_id,
                    condition,
                })
            }
            "header" | "comments" => {
                let file = raw.file.clone().ok_or_else(|| missing("file"))?;
                if raw.condition.is_some() {
                    tracing::warn!(
                        section,
                        action,
                        action_type = %raw.action_type,
                        "condition ignored on static action"
                    );
                }
                if raw.action_type == "header" {
                    Ok(Action::Header { file })
                } else {
                    Ok(Action::Comments {
                        file,
                        display_title: raw.display_title,
                    })
                }
            }
            other => Err(ConfigError::UnknownActionType {
                section,
                action,
                action_type: other.to_string(),
            }),
        }
    }

    fn convert_condition(
        section: usize,
        action: usize,
        raw: RawCondition,
    ) -> Result<Condition, ConfigError> {
        let variable = raw.var.ok_or(ConfigError::InvalidCondition {
            section,
            action,
            field: "var",
        })?;
        let expected_value = raw.value.ok_or(ConfigError::InvalidCondition {
            section,
            action,
            field: "value",
        })?;
        Ok(Condition {
            variable,
            expected_value,
            fallback: raw.fallback.unwrap_or(false),
        })
    }
}
