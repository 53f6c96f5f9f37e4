//! Built-in action programs

mod load_text_file;
mod save_document;

pub use load_text_file::LoadTextFileAction;
pub use save_document::{DEFAULT_OUTPUT_DIR, SaveDocumentAction};

use serde_json::Value;

use crate::domain::workflow::{value_to_string, Variables};
use crate::domain::DomainError;

/// Required string input, numbers and booleans are stringified
fn required_str(action: &str, input: &Variables, key: &str) -> Result<String, DomainError> {
    match input.get(key) {
        Some(Value::Null) | None => Err(DomainError::action(
            action,
            format!("missing required input '{}'", key),
        )),
        Some(value) => Ok(value_to_string(value)),
    }
}
