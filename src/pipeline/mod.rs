//! Pipeline documents.
//!
//! A [`PipelineTemplate`] is the typed form of a generated CI configuration:
//! workflows of step invocations, a trigger map and app-level environment
//! assignments. Templates are produced by the platform scanners as YAML
//! text; the compiler parses them back and injects the answers collected
//! while resolving an option tree.

pub mod builder;
pub mod catalog;
pub mod compiler;

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{InitError, Result};

pub use builder::{PipelineBuilder, PRIMARY_WORKFLOW, DEPLOY_WORKFLOW};
pub use catalog::StepCatalog;
pub use compiler::compile;

/// A single `KEY: value` environment assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvAssignment {
    pub key: String,
    pub value: String,
}

impl EnvAssignment {
    /// Create an assignment.
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl Serialize for EnvAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for EnvAssignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct AssignmentVisitor;

        impl<'de> Visitor<'de> for AssignmentVisitor {
            type Value = EnvAssignment;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a single KEY: value mapping")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let (key, value) = map
                    .next_entry::<String, String>()?
                    .ok_or_else(|| de::Error::custom("empty environment assignment"))?;
                if map.next_key::<String>()?.is_some() {
                    return Err(de::Error::custom(format!(
                        "environment assignment '{}' has more than one key",
                        key
                    )));
                }
                Ok(EnvAssignment { key, value })
            }
        }

        deserializer.deserialize_map(AssignmentVisitor)
    }
}

/// App-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct App {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub envs: Vec<EnvAssignment>,
}

impl App {
    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }
}

/// One `pattern → workflow` trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request_source_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    pub workflow: String,
}

impl TriggerItem {
    /// Trigger on pushes to branches matching `pattern`.
    pub fn push(pattern: &str, workflow: &str) -> Self {
        Self {
            push_branch: Some(pattern.to_string()),
            pull_request_source_branch: None,
            tag: None,
            workflow: workflow.to_string(),
        }
    }

    /// Trigger on pull requests from branches matching `pattern`.
    pub fn pull_request(pattern: &str, workflow: &str) -> Self {
        Self {
            push_branch: None,
            pull_request_source_branch: Some(pattern.to_string()),
            tag: None,
            workflow: workflow.to_string(),
        }
    }
}

/// Inputs and guards of a step invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_if: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<EnvAssignment>,
}

/// A step invocation, rendered as `<id>@<version>: {step}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepListItem {
    pub id: String,
    pub version: Option<String>,
    pub step: Step,
}

impl StepListItem {
    /// A step without title, guard or inputs.
    pub fn new(id: &str, version: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            version: version.map(str::to_string),
            step: Step::default(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: &str) -> Self {
        self.step.title = Some(title.to_string());
        self
    }

    /// Set the conditional guard.
    pub fn with_run_if(mut self, expression: &str) -> Self {
        self.step.run_if = Some(expression.to_string());
        self
    }

    /// Append an input.
    pub fn with_input(mut self, key: &str, value: &str) -> Self {
        self.step.inputs.push(EnvAssignment::new(key, value));
        self
    }

    /// The `<id>@<version>` reference.
    pub fn reference(&self) -> String {
        match &self.version {
            Some(version) => format!("{}@{}", self.id, version),
            None => self.id.clone(),
        }
    }

    fn from_reference(reference: &str, step: Step) -> Self {
        match reference.rsplit_once('@') {
            Some((id, version)) => Self {
                id: id.to_string(),
                version: Some(version.to_string()),
                step,
            },
            None => Self {
                id: reference.to_string(),
                version: None,
                step,
            },
        }
    }
}

impl Serialize for StepListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.reference(), &self.step)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for StepListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut entries = BTreeMap::<String, Step>::deserialize(deserializer)?;
        if entries.len() != 1 {
            return Err(de::Error::custom(format!(
                "step list item must have exactly one step, found {}",
                entries.len()
            )));
        }
        let (reference, step) = entries
            .pop_first()
            .ok_or_else(|| de::Error::custom("empty step list item"))?;
        Ok(Self::from_reference(&reference, step))
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    #[serde(default)]
    pub steps: Vec<StepListItem>,
}

impl Workflow {
    /// Step ids in execution order.
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }
}

/// A complete pipeline document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineTemplate {
    pub format_version: String,

    pub default_step_lib_source: String,

    pub project_type: String,

    #[serde(default, skip_serializing_if = "App::is_empty")]
    pub app: App,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trigger_map: Vec<TriggerItem>,

    #[serde(default)]
    pub workflows: BTreeMap<String, Workflow>,
}

impl PipelineTemplate {
    /// Parse template text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| InitError::TemplateParse {
            message: e.to_string(),
        })
    }

    /// Render as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| InitError::TemplateParse {
            message: e.to_string(),
        })
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| InitError::TemplateParse {
            message: e.to_string(),
        })
    }

    /// Look up a workflow.
    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }
}
