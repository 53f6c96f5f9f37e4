//! Built-in template executor: render, call the provider, extract tagged outputs

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::template::{TemplateDefinition, TemplateExecutor, TemplateOutput, TemplateRequest};
use crate::domain::workflow::{interpolate, EventBus, Variables, WorkflowEvent};
use crate::domain::DomainError;

/// Renders `{{var}}` placeholders into a single user message and reads
/// declared output variables back from `<name>…</name>` tags in the response.
#[derive(Debug, Clone, Default)]
pub struct PromptTemplateExecutor;

impl PromptTemplateExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Render the template body against the variables
    pub fn render(template: &TemplateDefinition, variables: &Variables) -> String {
        interpolate(&template.content, variables)
    }

    /// Build the provider request; template options override provider defaults
    pub fn build_request(
        template: &TemplateDefinition,
        provider: &dyn LlmProvider,
        variables: &Variables,
        stream: bool,
    ) -> LlmRequest {
        let options = provider.default_options().merge(&template.options());

        LlmRequest::builder()
            .user(Self::render(template, variables))
            .options(options)
            .stream(stream)
            .build()
    }

    /// Extract every declared output variable present as a tag; missing tags are skipped
    pub fn extract_output_variables(
        template: &TemplateDefinition,
        text: &str,
    ) -> Result<Variables, DomainError> {
        let mut variables = Variables::new();

        for name in &template.output_variables {
            let pattern = format!(r"(?s)<{0}>(.*?)</{0}>", regex::escape(name));
            let tag = Regex::new(&pattern)
                .map_err(|e| DomainError::template(&template.name, e.to_string()))?;

            if let Some(caps) = tag.captures(text) {
                variables.insert(name.clone(), Value::String(caps[1].trim().to_string()));
            }
        }

        Ok(variables)
    }

    async fn collect_stream(
        provider: &dyn LlmProvider,
        request: LlmRequest,
        events: &EventBus,
    ) -> Result<String, DomainError> {
        let mut stream = provider.chat_stream(request).await?;
        let mut text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(delta) = chunk.delta.filter(|d| !d.is_empty()) {
                text.push_str(&delta);
                events.publish(WorkflowEvent::StreamChunk { text: delta });
            }
        }

        Ok(text)
    }
}

#[async_trait]
impl TemplateExecutor for PromptTemplateExecutor {
    async fn execute(
        &self,
        request: TemplateRequest<'_>,
        events: &EventBus,
    ) -> Result<TemplateOutput, DomainError> {
        let TemplateRequest {
            template,
            provider,
            variables,
            stream,
        } = request;

        let llm_request = Self::build_request(template, provider.as_ref(), variables, stream);

        let snapshot = serde_json::to_value(&llm_request)
            .map_err(|e| DomainError::template(&template.name, e.to_string()))?;
        events.publish(WorkflowEvent::RequestSent { request: snapshot });

        debug!(
            template = %template.name,
            provider = %provider.provider_name(),
            stream = stream,
            "Executing template"
        );

        let text = if stream {
            Self::collect_stream(provider.as_ref(), llm_request, events).await?
        } else {
            let response = provider.chat(llm_request).await?;
            response.content().unwrap_or_default().to_string()
        };

        let output_variables = Self::extract_output_variables(template, &text)?;

        Ok(TemplateOutput {
            response: Value::String(text),
            output_variables,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{LlmOptions, MessageRole, MockLlmProvider};
    use serde_json::json;
    use std::sync::Arc;

    fn vars(value: Value) -> Variables {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn translator() -> TemplateDefinition {
        TemplateDefinition::new("translator", "Translate {{ text }} to {{lang}}")
            .with_model("gpt-4o")
            .with_parameters(LlmOptions::new().with_temperature(0.2))
            .with_output_variable("translation")
            .with_output_variable("notes")
    }

    #[test]
    fn test_render() {
        let rendered = PromptTemplateExecutor::render(
            &translator(),
            &vars(json!({"text": "hola", "lang": "English"})),
        );
        assert_eq!(rendered, "Translate hola to English");
    }

    #[test]
    fn test_build_request_layers_options() {
        let provider = MockLlmProvider::new("mock").with_default_options(
            LlmOptions::new().with_model("default-model").with_max_tokens(512),
        );

        let request =
            PromptTemplateExecutor::build_request(&translator(), &provider, &Variables::new(), true);

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.messages[0].content_text(), "Translate  to ");
        assert_eq!(request.options.model.as_deref(), Some("gpt-4o"));
        assert_eq!(request.options.temperature, Some(0.2));
        assert_eq!(request.options.max_tokens, Some(512));
        assert!(request.stream);
    }

    #[test]
    fn test_extract_output_variables() {
        let text = "Sure.\n<translation>\n  hello\n</translation>";
        let extracted = PromptTemplateExecutor::extract_output_variables(&translator(), text).unwrap();

        assert_eq!(extracted.get("translation"), Some(&json!("hello")));
        assert!(!extracted.contains_key("notes"));
    }

    #[tokio::test]
    async fn test_execute_streaming_publishes_chunks() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_text("<translation>hi</translation> done"));
        let bus = EventBus::new();
        let mut events = bus.subscribe();
        let template = translator();
        let variables = vars(json!({"text": "hola", "lang": "en"}));

        let output = PromptTemplateExecutor::new()
            .execute(
                TemplateRequest {
                    template: &template,
                    provider: provider.clone(),
                    variables: &variables,
                    stream: true,
                },
                &bus,
            )
            .await
            .unwrap();

        assert_eq!(output.response, json!("<translation>hi</translation> done"));
        assert_eq!(output.output_variables.get("translation"), Some(&json!("hi")));

        let first = events.recv().await.unwrap();
        assert!(matches!(first, WorkflowEvent::RequestSent { ref request } if request["stream"] == json!(true)));

        let mut streamed = String::new();
        while let Ok(event) = events.try_recv() {
            if let WorkflowEvent::StreamChunk { text } = event {
                streamed.push_str(&text);
            }
        }
        assert_eq!(streamed, "<translation>hi</translation> done");
    }

    #[tokio::test]
    async fn test_execute_without_streaming() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_text("plain answer"));
        let bus = EventBus::default();
        let template = TemplateDefinition::new("plain", "Say something");
        let variables = Variables::new();

        let output = PromptTemplateExecutor::new()
            .execute(
                TemplateRequest {
                    template: &template,
                    provider: provider.clone(),
                    variables: &variables,
                    stream: false,
                },
                &bus,
            )
            .await
            .unwrap();

        assert_eq!(output.response, json!("plain answer"));
        assert!(output.output_variables.is_empty());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_error("quota exceeded"));
        let template = TemplateDefinition::new("plain", "Say something");
        let variables = Variables::new();

        let err = PromptTemplateExecutor::new()
            .execute(
                TemplateRequest {
                    template: &template,
                    provider,
                    variables: &variables,
                    stream: true,
                },
                &EventBus::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::provider("mock", "quota exceeded"));
    }
}
