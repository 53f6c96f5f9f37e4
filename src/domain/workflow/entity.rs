//! Workflow definition entities

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::action::ActionProgram;
use super::Variables;
use crate::domain::template::TemplateDefinition;

/// Discriminant of a workflow step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Programmatic step backed by an [`ActionProgram`]
    Action,
    /// Template-backed LLM step
    Internal,
}

/// Where a step's result lands in the execution context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepOutput {
    /// Store the whole result under one name
    Single(String),
    /// Fan out: `output_variables[result_key]` is stored under `target_name`
    Mapping(HashMap<String, String>),
}

impl StepOutput {
    pub fn mapping<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for StepOutput {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<String> for StepOutput {
    fn from(name: String) -> Self {
        Self::Single(name)
    }
}

impl From<HashMap<String, String>> for StepOutput {
    fn from(mapping: HashMap<String, String>) -> Self {
        Self::Mapping(mapping)
    }
}

/// The executable part of a step
#[derive(Clone)]
pub enum StepKind {
    Action(Arc<dyn ActionProgram>),
    Internal {
        template: Arc<TemplateDefinition>,
        /// Overrides the workflow's default provider
        provider: Option<String>,
    },
}

/// One unit of work in a workflow
#[derive(Clone)]
pub struct WorkflowStep {
    kind: StepKind,

    /// Raw inputs: literals, `$name` references or `{{var}}` interpolations
    input: Variables,

    output: StepOutput,
}

impl WorkflowStep {
    /// Create an ACTION step
    pub fn action(program: Arc<dyn ActionProgram>, output: impl Into<StepOutput>) -> Self {
        Self {
            kind: StepKind::Action(program),
            input: Variables::new(),
            output: output.into(),
        }
    }

    /// Create an INTERNAL (template-backed) step
    pub fn internal(template: Arc<TemplateDefinition>, output: impl Into<StepOutput>) -> Self {
        Self {
            kind: StepKind::Internal {
                template,
                provider: None,
            },
            input: Variables::new(),
            output: output.into(),
        }
    }

    /// Set the provider override; ignored for ACTION steps
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        if let StepKind::Internal { provider, .. } = &mut self.kind {
            *provider = Some(provider_id.into());
        }
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.input.insert(key.into(), value.into());
        self
    }

    pub fn with_inputs(mut self, input: Variables) -> Self {
        self.input = input;
        self
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn step_type(&self) -> StepType {
        match self.kind {
            StepKind::Action(_) => StepType::Action,
            StepKind::Internal { .. } => StepType::Internal,
        }
    }

    pub fn input(&self) -> &Variables {
        &self.input
    }

    pub fn output(&self) -> &StepOutput {
        &self.output
    }

    /// Provider override of an INTERNAL step
    pub fn provider(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Internal { provider, .. } => provider.as_deref(),
            StepKind::Action(_) => None,
        }
    }

    /// Human-readable label: the template name or the action program name
    pub fn label(&self) -> String {
        match &self.kind {
            StepKind::Action(program) => program.name(),
            StepKind::Internal { template, .. } => template.name.clone(),
        }
    }
}

impl fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("type", &self.step_type())
            .field("label", &self.label())
            .field("provider", &self.provider())
            .field("input", &self.input)
            .field("output", &self.output)
            .finish()
    }
}

/// A workflow definition; immutable once execution starts
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    name: String,
    description: Option<String>,
    version: Option<String>,
    default_provider: Option<String>,
    steps: Vec<WorkflowStep>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            default_provider: None,
            steps: Vec::new(),
        }
    }

    // Builder methods

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = Some(provider.into());
        self
    }

    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    // Getters

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn default_provider(&self) -> Option<&str> {
        self.default_provider.as_deref()
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
