//! Domain layer - Core types, traits and pure logic

pub mod agent;
pub mod error;
pub mod llm;
pub mod template;
pub mod workflow;

pub use agent::{AgentConfig, AgentContext, AgentError, FunctionTool, Tool, ToolRegistry};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmOptions, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, LlmStream,
    Message, MessageRole, ModelDescriptor, ProviderRegistry, StreamChunk, ToolCall, ToolChoice,
    ToolDefinition, Usage,
};
pub use template::{TemplateDefinition, TemplateExecutor, TemplateOutput, TemplateRequest};
pub use workflow::{
    ActionProgram, ContextEntry, EventBus, ExecutionContext, ReferencePolicy, StepOutput, StepType,
    Variables, WorkflowDefinition, WorkflowError, WorkflowEvent, WorkflowExecutionResult,
    WorkflowExecutor, WorkflowResults, WorkflowStep,
};
