use serde::{Deserialize, Serialize};

use crate::domain::llm::LlmOptions;

/// A prompt template driving an INTERNAL workflow step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Prompt body with `{{ variable }}` placeholders
    pub content: String,

    /// Preferred model; overrides the provider's default model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generation parameters layered over the provider's defaults
    #[serde(default)]
    pub parameters: LlmOptions,

    /// Names of the values to extract from the response
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_variables: Vec<String>,
}

impl TemplateDefinition {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            description: None,
            content: content.into(),
            model: None,
            parameters: LlmOptions::default(),
            output_variables: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_parameters(mut self, parameters: LlmOptions) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_output_variable(mut self, name: impl Into<String>) -> Self {
        self.output_variables.push(name.into());
        self
    }

    /// Template options: the parameters plus the preferred model, if any
    pub fn options(&self) -> LlmOptions {
        match &self.model {
            Some(model) => self.parameters.clone().with_model(model.clone()),
            None => self.parameters.clone(),
        }
    }
}
