//! Template executor implementations

mod prompt_executor;

pub use prompt_executor::PromptTemplateExecutor;
