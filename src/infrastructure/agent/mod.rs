//! Agent loop, builder, manager and streaming

mod agent_impl;
mod builder;
mod manager;
mod stream;

pub use agent_impl::{Agent, NO_RESPONSE};
pub use builder::{AgentBuilder, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use manager::AgentManager;
pub use stream::{AgentStream, AgentStreamHandle};
