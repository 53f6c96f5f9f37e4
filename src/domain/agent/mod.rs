//! Agent domain: configuration, conversation state and tools
//!
//! An agent is a bounded loop that converses with a provider, invoking
//! registered tools when the model asks for them, until it produces a final
//! answer or runs out of iterations or time.

mod config;
mod context;
mod error;
mod tool;

pub use config::{
    AgentConfig, DEFAULT_MAX_EXECUTION_TIME_SECS, DEFAULT_MAX_ITERATIONS, DEFAULT_MEMORY_WINDOW,
};
pub use context::AgentContext;
pub use error::AgentError;
pub use tool::{FunctionTool, Tool, ToolHandler, ToolRegistry};
