use std::time::Duration;

use super::AgentError;
use crate::domain::llm::{LlmOptions, ToolChoice};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;
pub const DEFAULT_MAX_EXECUTION_TIME_SECS: u64 = 300;

/// Number of retained messages replayed on each turn when memory is enabled
pub const DEFAULT_MEMORY_WINDOW: usize = 5;

/// Static configuration of one agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub role: String,
    pub goal: String,
    pub backstory: String,

    /// Extra text appended to the synthesized system prompt
    pub system_prompt: Option<String>,

    /// Agent-level options, layered over the provider defaults
    pub llm_options: LlmOptions,

    pub tool_choice: ToolChoice,

    /// Retain and replay prior turns
    pub memory: bool,
    pub memory_window: usize,

    pub max_iterations: usize,
    pub max_execution_time: Duration,
}

impl AgentConfig {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            system_prompt: None,
            llm_options: LlmOptions::default(),
            tool_choice: ToolChoice::default(),
            memory: false,
            memory_window: DEFAULT_MEMORY_WINDOW,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_execution_time: Duration::from_secs(DEFAULT_MAX_EXECUTION_TIME_SECS),
        }
    }

    pub fn validate(&self) -> Result<(), AgentError> {
        if self.role.trim().is_empty() {
            return Err(AgentError::configuration("Agent role must not be empty"));
        }

        if self.max_iterations == 0 {
            return Err(AgentError::configuration(
                "max_iterations must be at least 1",
            ));
        }

        self.llm_options
            .validate()
            .map_err(|e| AgentError::configuration(e.to_string()))
    }

    /// Synthesize the system prompt from the persona, the tool descriptions
    /// and the extra system text
    pub fn system_prompt_with(&self, tool_descriptions: &str) -> String {
        format!(
            "Role: {}\nGoal: {}\nBackstory: {}\n\nAvailable Tools:\n{}\n\n{}",
            self.role,
            self.goal,
            self.backstory,
            tool_descriptions,
            self.system_prompt.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}
