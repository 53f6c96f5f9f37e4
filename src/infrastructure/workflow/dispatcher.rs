//! Routes a resolved step to its action program or to the template executor

use std::sync::Arc;

use tracing::debug;

use crate::domain::llm::ProviderRegistry;
use crate::domain::template::{TemplateExecutor, TemplateRequest};
use crate::domain::workflow::{
    EventBus, StepKind, Variables, WorkflowError, WorkflowExecutionResult, WorkflowStep,
};

/// Step dispatcher
#[derive(Debug, Clone)]
pub struct StepDispatcher {
    template_executor: Arc<dyn TemplateExecutor>,
    stream_templates: bool,
}

impl StepDispatcher {
    pub fn new(template_executor: Arc<dyn TemplateExecutor>, stream_templates: bool) -> Self {
        Self {
            template_executor,
            stream_templates,
        }
    }

    /// Run one step against its resolved input.
    ///
    /// `index` is zero-based; errors report the one-based step number.
    pub async fn dispatch(
        &self,
        index: usize,
        step: &WorkflowStep,
        default_provider: Option<&str>,
        providers: &ProviderRegistry,
        input: Variables,
        events: &EventBus,
    ) -> Result<WorkflowExecutionResult, WorkflowError> {
        match step.kind() {
            StepKind::Action(program) => {
                let name = program.name();
                debug!(step = %name, "Dispatching action step");

                let output = program
                    .execute(input)
                    .await
                    .map_err(|e| WorkflowError::step_execution(&name, e.to_string()))?;

                WorkflowExecutionResult::from_action_output(output)
                    .map_err(|e| WorkflowError::step_execution(&name, e.to_string()))
            }
            StepKind::Internal { template, provider } => {
                let resolved = providers
                    .resolve(provider.as_deref(), default_provider)
                    .ok_or_else(|| {
                        WorkflowError::provider_not_found(
                            index + 1,
                            provider.as_deref().or(default_provider),
                        )
                    })?;

                debug!(
                    step = %template.name,
                    provider = %resolved.provider_name(),
                    "Dispatching template step"
                );

                let output = self
                    .template_executor
                    .execute(
                        TemplateRequest {
                            template: template.as_ref(),
                            provider: resolved,
                            variables: &input,
                            stream: self.stream_templates,
                        },
                        events,
                    )
                    .await
                    .map_err(|e| WorkflowError::step_execution(&template.name, e.to_string()))?;

                Ok(WorkflowExecutionResult::new(
                    output.response,
                    output.output_variables,
                ))
            }
        }
    }
}
