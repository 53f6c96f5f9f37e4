//! Workflow executor implementation

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use super::dispatcher::StepDispatcher;
use crate::config::WorkflowSettings;
use crate::domain::llm::ProviderRegistry;
use crate::domain::template::TemplateExecutor;
use crate::domain::workflow::{
    EventBus, ExecutionContext, ReferencePolicy, StepInfo, StepKind, Variables,
    WorkflowDefinition, WorkflowError, WorkflowEvent, WorkflowExecutionResult, WorkflowExecutor,
    WorkflowResults, WorkflowStep,
};

/// Configuration for the workflow executor
#[derive(Debug, Clone)]
pub struct WorkflowExecutorConfig {
    pub reference_policy: ReferencePolicy,

    /// Request streamed output from template steps
    pub stream_templates: bool,
}

impl Default for WorkflowExecutorConfig {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::Lenient,
            stream_templates: true,
        }
    }
}

impl From<&WorkflowSettings> for WorkflowExecutorConfig {
    fn from(settings: &WorkflowSettings) -> Self {
        Self {
            reference_policy: settings.reference_policy,
            stream_templates: settings.stream_templates,
        }
    }
}

/// Sequential workflow executor.
///
/// Steps run strictly in declared order. Each step's inputs are resolved
/// against the results committed so far, the step is dispatched, and its
/// result is committed before the next step starts. The first failure aborts
/// the run.
#[derive(Debug)]
pub struct WorkflowExecutorImpl {
    dispatcher: StepDispatcher,
    events: EventBus,
    config: WorkflowExecutorConfig,
}

impl WorkflowExecutorImpl {
    /// Create a new executor
    pub fn new(template_executor: Arc<dyn TemplateExecutor>) -> Self {
        Self::with_config(template_executor, WorkflowExecutorConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(
        template_executor: Arc<dyn TemplateExecutor>,
        config: WorkflowExecutorConfig,
    ) -> Self {
        Self {
            dispatcher: StepDispatcher::new(template_executor, config.stream_templates),
            events: EventBus::default(),
            config,
        }
    }

    /// Build from application settings
    pub fn from_settings(template_executor: Arc<dyn TemplateExecutor>, settings: &WorkflowSettings) -> Self {
        Self::with_config(template_executor, settings.into())
    }

    /// Publish lifecycle events on a caller-owned bus
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &WorkflowExecutorConfig {
        &self.config
    }

    /// Reject definitions whose template options are out of range before any step runs
    fn validate(workflow: &WorkflowDefinition) -> Result<(), WorkflowError> {
        for (index, step) in workflow.steps().iter().enumerate() {
            if let StepKind::Internal { template, .. } = step.kind() {
                template.options().validate().map_err(|e| {
                    WorkflowError::validation(format!("step {} ('{}'): {}", index + 1, template.name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Resolve inputs and dispatch a single step
    async fn execute_step(
        &self,
        index: usize,
        step: &WorkflowStep,
        workflow: &WorkflowDefinition,
        providers: &ProviderRegistry,
        context: &ExecutionContext,
    ) -> Result<WorkflowExecutionResult, WorkflowError> {
        let input = context.resolve_inputs(step.input(), self.config.reference_policy)?;

        self.dispatcher
            .dispatch(
                index,
                step,
                workflow.default_provider(),
                providers,
                input,
                &self.events,
            )
            .await
    }
}

#[async_trait]
impl WorkflowExecutor for WorkflowExecutorImpl {
    async fn execute(
        &self,
        workflow: &WorkflowDefinition,
        providers: &ProviderRegistry,
        initial_input: Variables,
    ) -> Result<WorkflowResults, WorkflowError> {
        Self::validate(workflow)?;

        let run_id = Uuid::new_v4();
        let span = info_span!("workflow", run_id = %run_id, workflow = %workflow.name());

        async {
            let start = Instant::now();
            let mut context = ExecutionContext::new(initial_input);

            info!(steps = workflow.steps().len(), "Executing workflow");

            for (index, step) in workflow.steps().iter().enumerate() {
                let info = StepInfo::from_step(index, step);
                self.events
                    .publish(WorkflowEvent::StepStarted { step: info.clone() });

                info!(step_index = index + 1, step = %info.label, "Executing step");

                match self
                    .execute_step(index, step, workflow, providers, &context)
                    .await
                {
                    Ok(result) => {
                        context.commit(step.output(), result.clone());
                        self.events
                            .publish(WorkflowEvent::StepCompleted { step: info, result });
                        info!(step_index = index + 1, "Completed step");
                    }
                    Err(e) => {
                        error!(step_index = index + 1, error = %e, "Step failed");
                        self.events.publish(WorkflowEvent::StepFailed {
                            step: info,
                            error: e.clone(),
                        });
                        return Err(e);
                    }
                }
            }

            info!(
                duration_ms = start.elapsed().as_millis() as u64,
                "Workflow completed"
            );

            Ok(context.into_results())
        }
        .instrument(span)
        .await
    }
}
