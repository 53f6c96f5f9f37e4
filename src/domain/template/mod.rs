//! Prompt template definitions and the template execution contract

mod definition;
mod executor;

pub use definition::TemplateDefinition;
pub use executor::{TemplateExecutor, TemplateOutput, TemplateRequest};
