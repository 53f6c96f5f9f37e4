use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::TemplateDefinition;
use crate::domain::DomainError;
use crate::domain::llm::LlmProvider;
use crate::domain::workflow::{EventBus, Variables};

/// Input to a template execution
#[derive(Debug, Clone)]
pub struct TemplateRequest<'a> {
    pub template: &'a TemplateDefinition,
    pub provider: Arc<dyn LlmProvider>,
    pub variables: &'a Variables,
    /// Request streamed output; chunks are published on the event bus
    pub stream: bool,
}

/// What a template execution produces
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOutput {
    pub response: Value,
    pub output_variables: Variables,
}

/// Executes a template against a provider.
///
/// Implementations may publish `StreamChunk` and `RequestSent` events while
/// running; the workflow executor forwards nothing else on their behalf.
#[async_trait]
pub trait TemplateExecutor: Send + Sync + Debug {
    async fn execute(
        &self,
        request: TemplateRequest<'_>,
        events: &EventBus,
    ) -> Result<TemplateOutput, DomainError>;
}
