//! Workflow executor trait and result types

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::{ContextEntry, Variables};
use super::entity::WorkflowDefinition;
use super::error::WorkflowError;
use crate::domain::llm::ProviderRegistry;

/// Committed results of a completed run, keyed by logical result name
pub type WorkflowResults = HashMap<String, ContextEntry>;

/// Result of executing a single step; never mutated after it is produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowExecutionResult {
    /// Raw step response: text for template steps, serialized output for actions
    pub response: Value,

    /// Named sub-results available for output fan-out
    pub output_variables: Variables,
}

impl WorkflowExecutionResult {
    pub fn new(response: Value, output_variables: Variables) -> Self {
        Self {
            response,
            output_variables,
        }
    }

    /// Wrap an action program's output: the response is its JSON serialization
    pub fn from_action_output(output: Variables) -> Result<Self, serde_json::Error> {
        let response = serde_json::to_string(&output)?;
        Ok(Self::new(Value::String(response), output))
    }

    pub fn response_text(&self) -> Option<&str> {
        self.response.as_str()
    }
}

/// Trait for workflow execution
#[async_trait]
pub trait WorkflowExecutor: Send + Sync + std::fmt::Debug {
    /// Run every step of `workflow` in declared order against a fresh context
    /// seeded with `initial_input`.
    ///
    /// Any step failure aborts the run; no partial results are returned.
    async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        providers: &ProviderRegistry,
        initial_input: Variables,
    ) -> Result<WorkflowResults, WorkflowError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_action_output() {
        let mut output = Variables::new();
        output.insert("path".to_string(), json!("./output/a.txt"));
        output.insert("bytes".to_string(), json!(12));

        let result = WorkflowExecutionResult::from_action_output(output.clone()).unwrap();

        assert_eq!(
            result.response_text(),
            Some(r#"{"bytes":12,"path":"./output/a.txt"}"#)
        );
        assert_eq!(result.output_variables, output);
    }

    #[test]
    fn test_structured_response_has_no_text() {
        let result = WorkflowExecutionResult::new(json!({"k": 1}), Variables::new());
        assert_eq!(result.response_text(), None);
    }
}
