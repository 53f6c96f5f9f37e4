//! Lifecycle events published by the workflow executor

use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::entity::{StepType, WorkflowStep};
use super::error::WorkflowError;
use super::executor::WorkflowExecutionResult;

/// Identifies the step an event refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepInfo {
    pub index: usize,
    pub label: String,
    pub step_type: StepType,
}

impl StepInfo {
    pub fn from_step(index: usize, step: &WorkflowStep) -> Self {
        Self {
            index,
            label: step.label(),
            step_type: step.step_type(),
        }
    }
}

/// Typed workflow lifecycle event
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    StepStarted { step: StepInfo },
    StepCompleted { step: StepInfo, result: WorkflowExecutionResult },
    StepFailed { step: StepInfo, error: WorkflowError },
    /// Text fragment forwarded from a streaming template execution
    StreamChunk { text: String },
    /// Request about to be sent to a provider, for diagnostics
    RequestSent { request: Value },
}

/// In-process fan-out channel for [`WorkflowEvent`]s.
///
/// Each subscriber owns an unbounded queue, so every subscriber observes every
/// event in publication order no matter how many stream chunks a step emits
/// or how far behind it is. Dropped receivers are pruned on the next publish.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Vec<mpsc::UnboundedSender<WorkflowEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish to all current subscribers; having none is not an error
    pub fn publish(&self, event: WorkflowEvent) {
        let mut subscribers = match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<WorkflowEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        match self.subscribers.write() {
            Ok(mut guard) => guard.push(tx),
            Err(poisoned) => poisoned.into_inner().push(tx),
        }
        rx
    }

    /// Subscribe as a `Stream`
    pub fn stream(&self) -> UnboundedReceiverStream<WorkflowEvent> {
        UnboundedReceiverStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.read() {
            Ok(guard) => guard.iter().filter(|tx| !tx.is_closed()).count(),
            Err(poisoned) => poisoned.into_inner().iter().filter(|tx| !tx.is_closed()).count(),
        }
    }
}
