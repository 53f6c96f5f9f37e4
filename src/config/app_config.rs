use serde::Deserialize;

use crate::domain::agent::{
    DEFAULT_MAX_EXECUTION_TIME_SECS, DEFAULT_MAX_ITERATIONS, DEFAULT_MEMORY_WINDOW,
};
use crate::domain::workflow::ReferencePolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub workflow: WorkflowSettings,
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Workflow executor settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    /// Treatment of `$name` references with no committed result
    pub reference_policy: ReferencePolicy,

    /// Request streamed output from template steps
    pub stream_templates: bool,
}

/// Defaults applied by the agent builder
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    pub max_execution_time_secs: u64,
    pub memory_window: usize,
    pub tool_choice: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::default(),
            stream_templates: true,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_execution_time_secs: DEFAULT_MAX_EXECUTION_TIME_SECS,
            memory_window: DEFAULT_MEMORY_WINDOW,
            tool_choice: "auto".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env`, then `config/default`, `config/local` and `APP__*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: Self = config.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.agent.max_iterations == 0 {
            return Err(config::ConfigError::Message(
                "agent.max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.agent.tool_choice.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "agent.tool_choice must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.workflow.reference_policy, ReferencePolicy::Lenient);
        assert!(config.workflow.stream_templates);
        assert_eq!(config.agent.max_iterations, 20);
        assert_eq!(config.agent.max_execution_time_secs, 300);
        assert_eq!(config.agent.memory_window, 5);
        assert_eq!(config.agent.tool_choice, "auto");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_source_falls_back_to_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("workflow.reference_policy", "strict")
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.workflow.reference_policy, ReferencePolicy::Strict);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.workflow.stream_templates);
        assert_eq!(config.agent.max_iterations, 20);
    }

    #[test]
    fn test_validate_rejects_zero_iterations() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }
}
