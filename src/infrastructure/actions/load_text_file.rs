use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::required_str;
use crate::domain::workflow::{ActionProgram, Variables};
use crate::domain::DomainError;

const NAME: &str = "load_text_file";

/// Reads a UTF-8 text file: `{path}` -> `{content}`
#[derive(Debug, Clone, Default)]
pub struct LoadTextFileAction;

impl LoadTextFileAction {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionProgram for LoadTextFileAction {
    fn name(&self) -> String {
        NAME.to_string()
    }

    async fn execute(&self, input: Variables) -> Result<Variables, DomainError> {
        let path = required_str(NAME, &input, "path")?;

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| DomainError::action(NAME, format!("failed to read '{}': {}", path, e)))?;

        debug!(path = %path, bytes = content.len(), "Loaded text file");

        let mut output = Variables::new();
        output.insert("content".to_string(), Value::String(content));
        Ok(output)
    }
}
