//! LLM provider domain models and traits

mod message;
mod options;
mod provider;
mod provider_registry;
mod request;
mod response;
mod tool_call;

pub use message::{Message, MessageRole};
pub use options::LlmOptions;
pub use provider::{LlmProvider, LlmStream};
pub use provider_registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{FinishReason, LlmResponse, ModelDescriptor, StreamChunk, Usage};
pub use tool_call::{ToolCall, ToolChoice, ToolDefinition};

#[cfg(test)]
pub use provider::mock::{self, MockLlmProvider};
