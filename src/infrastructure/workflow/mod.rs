//! Workflow infrastructure implementations

mod dispatcher;
mod executor_impl;

pub use dispatcher::StepDispatcher;
pub use executor_impl::{WorkflowExecutorConfig, WorkflowExecutorImpl};
