//! Workflow domain module
//!
//! A workflow is an ordered list of steps executed once, start to finish,
//! against a shared execution context. Steps are either programmatic ACTION
//! steps or template-backed INTERNAL steps.
//!
//! ## Input references
//!
//! - `$name` - result committed by an earlier step under `name`
//! - `{{ name }}` - string interpolation of a run variable

mod action;
mod context;
mod entity;
mod error;
mod event;
mod executor;

#[cfg(test)]
pub use action::MockActionProgram;
pub use action::ActionProgram;
pub use context::{
    ContextEntry, ExecutionContext, ReferencePolicy, Variables, has_interpolation, interpolate,
    value_to_string,
};
pub use entity::{StepKind, StepOutput, StepType, WorkflowDefinition, WorkflowStep};
pub use error::WorkflowError;
pub use event::{EventBus, StepInfo, WorkflowEvent};
pub use executor::{WorkflowExecutionResult, WorkflowExecutor, WorkflowResults};
