//! Workflow execution context and input resolution
//!
//! Step inputs support two reference forms:
//! - `$name` - the result committed by an earlier step under `name`
//! - `{{ name }}` - interpolation of the run variable `name` into a string
//!
//! Anything else (including numbers and booleans) passes through unchanged.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::WorkflowError;
use super::executor::WorkflowExecutionResult;
use super::StepOutput;

/// Named values flowing between steps
pub type Variables = serde_json::Map<String, Value>;

/// Prefix marking a cross-step result reference
const REFERENCE_PREFIX: char = '$';

/// Regex for interpolation spans: {{name}} or {{ name }}
static INTERPOLATION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^}]+)\}\}").unwrap());

/// How a `$name` reference with no committed result is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Resolve to `null` and keep going
    #[default]
    Lenient,
    /// Fail the step with [`WorkflowError::UnresolvedReference`]
    Strict,
}

/// A value committed into [`ExecutionContext::results`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextEntry {
    /// A whole step result, committed under a single output name
    Execution(WorkflowExecutionResult),
    /// One fanned-out output variable; `null` when the step did not produce it
    Value(Value),
}

impl ContextEntry {
    /// The value a `$name` reference resolves to, `None` when absent.
    ///
    /// For a whole result this is the response, falling back to the output
    /// variables when the response is empty.
    pub fn reference_value(&self) -> Option<Value> {
        match self {
            Self::Execution(result) if !is_empty_response(&result.response) => {
                Some(result.response.clone())
            }
            Self::Execution(result) => Some(Value::Object(result.output_variables.clone())),
            Self::Value(Value::Null) => None,
            Self::Value(value) => Some(value.clone()),
        }
    }

    pub fn as_execution(&self) -> Option<&WorkflowExecutionResult> {
        match self {
            Self::Execution(result) => Some(result),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Execution(_) => None,
        }
    }
}

/// Mutable state of one workflow run
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Caller-supplied variables, read-only during the run
    variables: Variables,

    /// Committed step results keyed by logical result name
    results: HashMap<String, ContextEntry>,
}

impl ExecutionContext {
    /// Create a fresh context seeded with the initial input
    pub fn new(variables: Variables) -> Self {
        Self {
            variables,
            results: HashMap::new(),
        }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn results(&self) -> &HashMap<String, ContextEntry> {
        &self.results
    }

    pub fn result(&self, name: &str) -> Option<&ContextEntry> {
        self.results.get(name)
    }

    pub fn into_results(self) -> HashMap<String, ContextEntry> {
        self.results
    }

    /// Commit a step result according to the step's output declaration.
    ///
    /// A mapping entry whose key is missing from the output variables is stored
    /// as `null` rather than failing the step.
    pub fn commit(&mut self, output: &StepOutput, result: WorkflowExecutionResult) {
        match output {
            StepOutput::Single(name) => {
                self.results
                    .insert(name.clone(), ContextEntry::Execution(result));
            }
            StepOutput::Mapping(mapping) => {
                for (result_key, target) in mapping {
                    let value = result
                        .output_variables
                        .get(result_key)
                        .cloned()
                        .unwrap_or(Value::Null);

                    if value.is_null() {
                        debug!(result_key = %result_key, target = %target, "Output key not produced by step");
                    }

                    self.results.insert(target.clone(), ContextEntry::Value(value));
                }
            }
        }
    }

    /// Resolve every raw input against the current context; the key set is preserved
    pub fn resolve_inputs(
        &self,
        inputs: &Variables,
        policy: ReferencePolicy,
    ) -> Result<Variables, WorkflowError> {
        inputs
            .iter()
            .map(|(key, raw)| Ok((key.clone(), self.resolve_value(raw, policy)?)))
            .collect()
    }

    /// Resolve a single raw input value
    pub fn resolve_value(&self, raw: &Value, policy: ReferencePolicy) -> Result<Value, WorkflowError> {
        let Value::String(text) = raw else {
            return Ok(raw.clone());
        };

        if let Some(name) = text.strip_prefix(REFERENCE_PREFIX) {
            return self.resolve_reference(name, policy);
        }

        if has_interpolation(text) {
            return Ok(Value::String(interpolate(text, &self.variables)));
        }

        Ok(raw.clone())
    }

    fn resolve_reference(&self, name: &str, policy: ReferencePolicy) -> Result<Value, WorkflowError> {
        match self.results.get(name).and_then(ContextEntry::reference_value) {
            Some(value) => Ok(value),
            None => match policy {
                ReferencePolicy::Lenient => {
                    warn!(reference = %name, "Reference resolved to nothing");
                    Ok(Value::Null)
                }
                ReferencePolicy::Strict => Err(WorkflowError::unresolved_reference(name)),
            },
        }
    }
}

/// Check if a string contains an interpolation span
pub fn has_interpolation(text: &str) -> bool {
    INTERPOLATION_PATTERN.is_match(text)
}

/// Replace every `{{ name }}` span with the string form of `variables[name]`.
///
/// Missing variables become the empty string; text outside spans is untouched
/// and substituted text is never re-scanned.
pub fn interpolate(text: &str, variables: &Variables) -> String {
    INTERPOLATION_PATTERN
        .replace_all(text, |caps: &Captures| {
            variables
                .get(caps[1].trim())
                .map(value_to_string)
                .unwrap_or_default()
        })
        .into_owned()
}

/// Convert a JSON value to a string representation
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),

        // For arrays and objects, use JSON representation
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn is_empty_response(response: &Value) -> bool {
    match response {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
