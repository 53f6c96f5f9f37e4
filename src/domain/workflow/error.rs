//! Workflow error types

use thiserror::Error;

/// Errors that can abort a workflow run
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WorkflowError {
    /// No provider could be resolved for a template step (1-based step number)
    #[error("Provider not found for step {step}: '{provider}'")]
    ProviderNotFound { step: usize, provider: String },

    /// A `$name` reference had no committed result under the strict policy
    #[error("Unresolved reference: ${0}")]
    UnresolvedReference(String),

    #[error("Step execution failed in '{step}': {message}")]
    StepExecution { step: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl WorkflowError {
    pub fn provider_not_found(step: usize, provider: Option<&str>) -> Self {
        Self::ProviderNotFound {
            step,
            provider: provider.unwrap_or_default().to_string(),
        }
    }

    pub fn unresolved_reference(name: impl Into<String>) -> Self {
        Self::UnresolvedReference(name.into())
    }

    pub fn step_execution(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecution {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
