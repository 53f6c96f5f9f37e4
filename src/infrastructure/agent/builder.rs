use std::sync::Arc;
use std::time::Duration;

use super::agent_impl::Agent;
use crate::config::AgentSettings;
use crate::domain::agent::{AgentConfig, AgentError, Tool, ToolRegistry};
use crate::domain::llm::{LlmOptions, LlmProvider, ToolChoice};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Fluent construction of an [`Agent`]
#[derive(Debug)]
pub struct AgentBuilder {
    config: AgentConfig,
    llm_options: Option<LlmOptions>,
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
}

impl AgentBuilder {
    pub fn new(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            config: AgentConfig::new(role, goal, backstory),
            llm_options: None,
            provider: None,
            tools: ToolRegistry::new(),
        }
    }

    /// Apply configured defaults for bounds, memory window and tool choice
    pub fn with_settings(mut self, settings: &AgentSettings) -> Self {
        self.config.max_iterations = settings.max_iterations;
        self.config.max_execution_time = Duration::from_secs(settings.max_execution_time_secs);
        self.config.memory_window = settings.memory_window;
        self.config.tool_choice = settings.tool_choice.parse().unwrap_or_default();
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Merge options into any set earlier; later values win
    pub fn with_llm_options(mut self, options: LlmOptions) -> Self {
        self.llm_options = Some(match self.llm_options {
            Some(existing) => existing.merge(&options),
            None => options,
        });
        self
    }

    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.register_arc(tool);
        }
        self
    }

    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.config.memory = enabled;
        self
    }

    pub fn with_memory_window(mut self, size: usize) -> Self {
        self.config.memory_window = size;
        self
    }

    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.config.max_iterations = iterations;
        self
    }

    pub fn with_max_execution_time(mut self, limit: Duration) -> Self {
        self.config.max_execution_time = limit;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.config.tool_choice = choice;
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        let provider = self.provider.ok_or_else(|| {
            AgentError::configuration("Provider must be set before building the agent")
        })?;

        let mut config = self.config;
        config.llm_options = self.llm_options.unwrap_or_else(|| {
            LlmOptions::new()
                .with_model(DEFAULT_MODEL)
                .with_temperature(DEFAULT_TEMPERATURE)
                .with_max_tokens(DEFAULT_MAX_TOKENS)
        });

        Ok(Agent::new(config, provider)?.with_tools(self.tools))
    }
}
