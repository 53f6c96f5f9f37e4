//! Infrastructure layer - Executors, the agent loop and built-in collaborators

pub mod actions;
pub mod agent;
pub mod logging;
pub mod template;
pub mod workflow;

pub use actions::{LoadTextFileAction, SaveDocumentAction};
pub use agent::{Agent, AgentBuilder, AgentManager, AgentStream, AgentStreamHandle};
pub use logging::{build_subscriber, init_logging};
pub use template::PromptTemplateExecutor;
pub use workflow::{StepDispatcher, WorkflowExecutorConfig, WorkflowExecutorImpl};
