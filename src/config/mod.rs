//! Application configuration

mod app_config;

pub use app_config::{AgentSettings, AppConfig, LogFormat, LoggingConfig, WorkflowSettings};
