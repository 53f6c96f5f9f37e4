//! LLM Workflow Engine
//!
//! Orchestrates multi-step LLM pipelines and bounded tool-calling agents:
//! - Sequential workflows of template (LLM) and action (program) steps
//! - `$name` references and `{{ var }}` interpolation between steps
//! - Typed lifecycle events fanned out to every subscriber without loss
//! - Agents that call tools until they answer or exhaust their budget

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    AgentError, DomainError, EventBus, ProviderRegistry, Variables, WorkflowDefinition,
    WorkflowError, WorkflowEvent, WorkflowExecutor, WorkflowStep,
};
pub use infrastructure::{
    init_logging, Agent, AgentBuilder, AgentManager, PromptTemplateExecutor, WorkflowExecutorImpl,
};
