use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::required_str;
use crate::domain::workflow::{ActionProgram, Variables};
use crate::domain::DomainError;

const NAME: &str = "save_document";

pub const DEFAULT_OUTPUT_DIR: &str = "./output";

/// Writes `{content, fileName?}` into the output directory: -> `{path, message}`
#[derive(Debug, Clone)]
pub struct SaveDocumentAction {
    output_dir: PathBuf,
}

impl SaveDocumentAction {
    pub fn new() -> Self {
        Self::with_output_dir(DEFAULT_OUTPUT_DIR)
    }

    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    fn default_file_name() -> String {
        format!("result_{}.txt", Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ"))
    }

    /// Only plain relative names are accepted; the target must stay inside the output directory
    fn check_file_name(file_name: &str) -> Result<(), DomainError> {
        let escapes = Path::new(file_name).components().any(|component| {
            matches!(
                component,
                Component::RootDir | Component::Prefix(_) | Component::ParentDir
            )
        });

        if escapes {
            return Err(DomainError::action(
                NAME,
                format!("fileName '{}' must be a relative path inside the output directory", file_name),
            ));
        }
        Ok(())
    }
}

impl Default for SaveDocumentAction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionProgram for SaveDocumentAction {
    fn name(&self) -> String {
        NAME.to_string()
    }

    async fn execute(&self, input: Variables) -> Result<Variables, DomainError> {
        let content = required_str(NAME, &input, "content")?;
        let file_name = match input.get("fileName") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => Self::default_file_name(),
        };
        Self::check_file_name(&file_name)?;

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| DomainError::action(NAME, format!("failed to create output directory: {}", e)))?;

        let path = self.output_dir.join(&file_name);
        tokio::fs::write(&path, content.as_bytes())
            .await
            .map_err(|e| DomainError::action(NAME, format!("failed to write '{}': {}", path.display(), e)))?;

        let path = path.display().to_string();
        info!(path = %path, "Document saved");

        let mut output = Variables::new();
        output.insert(
            "message".to_string(),
            Value::String(format!("Document saved to {}", path)),
        );
        output.insert("path".to_string(), Value::String(path));
        Ok(output)
    }
}
