use thiserror::Error;

use crate::domain::DomainError;

/// Errors raised by agents and the agent manager
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AgentError {
    #[error("Maximum iterations exceeded ({max_iterations})")]
    IterationLimitExceeded { max_iterations: usize },

    #[error("Execution time limit exceeded ({seconds}s)")]
    TimeLimitExceeded { seconds: u64 },

    #[error("Tool {0} not found")]
    ToolNotFound(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error(transparent)]
    Provider(#[from] DomainError),

    #[error("Agent configuration error: {0}")]
    Configuration(String),

    #[error("Agent {0} not found")]
    AgentNotFound(String),

    #[error("Agent {0} already exists")]
    AgentAlreadyExists(String),
}

impl AgentError {
    pub fn iteration_limit(max_iterations: usize) -> Self {
        Self::IterationLimitExceeded { max_iterations }
    }

    pub fn time_limit(seconds: u64) -> Self {
        Self::TimeLimitExceeded { seconds }
    }

    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound(name.into())
    }

    pub fn invalid_tool_arguments(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidToolArguments {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn tool_execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn agent_not_found(name: impl Into<String>) -> Self {
        Self::AgentNotFound(name.into())
    }

    pub fn agent_already_exists(name: impl Into<String>) -> Self {
        Self::AgentAlreadyExists(name.into())
    }

    /// Whether this error is one of the loop bounds
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            Self::IterationLimitExceeded { .. } | Self::TimeLimitExceeded { .. }
        )
    }
}
