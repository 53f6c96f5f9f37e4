use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::response::StreamChunk;
use super::{LlmOptions, LlmRequest, LlmResponse, ModelDescriptor};
use crate::domain::DomainError;

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, DomainError>> + Send>>;

/// Trait for LLM providers (OpenAI, Google, DeepSeek, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Send a streaming chat completion request.
    ///
    /// The returned stream is finite and ends when the provider signals completion.
    async fn chat_stream(&self, request: LlmRequest) -> Result<LlmStream, DomainError>;

    /// List the models this provider can serve
    async fn list_models(&self) -> Result<Vec<ModelDescriptor>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Options applied beneath agent and call-site options
    fn default_options(&self) -> LlmOptions {
        LlmOptions::default()
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::{FinishReason, Message, ToolCall};
    use futures::stream;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider: responses are served in order and the last one repeats.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: String,
        responses: Mutex<VecDeque<LlmResponse>>,
        error: Option<String>,
        stream_failures: AtomicUsize,
        interrupted_streams: AtomicUsize,
        interrupt_after: usize,
        defaults: LlmOptions,
        requests: Mutex<Vec<LlmRequest>>,
        call_count: AtomicUsize,
    }

    impl MockLlmProvider {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                responses: Mutex::new(VecDeque::new()),
                error: None,
                stream_failures: AtomicUsize::new(0),
                interrupted_streams: AtomicUsize::new(0),
                interrupt_after: 0,
                defaults: LlmOptions::default(),
                requests: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn with_response(self, response: LlmResponse) -> Self {
            self.responses.lock().unwrap().push_back(response);
            self
        }

        pub fn with_text(self, text: impl Into<String>) -> Self {
            self.with_response(text_response(text))
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Fail the first `count` stream attempts before succeeding
        pub fn with_stream_failures(self, count: usize) -> Self {
            self.stream_failures.store(count, Ordering::SeqCst);
            self
        }

        /// Break the first `count` opened streams with an error after `after` deltas
        pub fn with_interrupted_streams(mut self, count: usize, after: usize) -> Self {
            self.interrupted_streams.store(count, Ordering::SeqCst);
            self.interrupt_after = after;
            self
        }

        pub fn with_default_options(mut self, defaults: LlmOptions) -> Self {
            self.defaults = defaults;
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }

        fn next_response(&self) -> Option<LlmResponse> {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop_front()
            } else {
                responses.front().cloned()
            }
        }
    }

    pub fn text_response(text: impl Into<String>) -> LlmResponse {
        LlmResponse::new(
            "mock-id".to_string(),
            "mock-model".to_string(),
            Message::assistant(text),
        )
        .with_finish_reason(FinishReason::Stop)
    }

    pub fn tool_call_response(name: &str, arguments: &str) -> LlmResponse {
        LlmResponse::new(
            "mock-id".to_string(),
            "mock-model".to_string(),
            Message::assistant(""),
        )
        .with_tool_calls(vec![ToolCall::new("call-1", name, arguments)])
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(&self.name, error));
            }

            self.next_response()
                .ok_or_else(|| DomainError::provider(&self.name, "No mock response configured"))
        }

        async fn chat_stream(&self, request: LlmRequest) -> Result<LlmStream, DomainError> {
            let remaining = self.stream_failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.stream_failures.store(remaining - 1, Ordering::SeqCst);
                self.call_count.fetch_add(1, Ordering::SeqCst);
                return Err(DomainError::provider(&self.name, "stream interrupted"));
            }

            let response = self.chat(request).await?;
            let content = response.content().unwrap_or("").to_string();

            let deltas = content.split_inclusive(' ').map(|word| {
                Ok(StreamChunk::new(response.id.clone(), response.model.clone())
                    .with_delta(word.to_string()))
            });

            let interrupted = self
                .interrupted_streams
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();

            let chunks: Vec<Result<StreamChunk, DomainError>> = if interrupted {
                deltas
                    .take(self.interrupt_after)
                    .chain(std::iter::once(Err(DomainError::provider(
                        &self.name,
                        "connection reset",
                    ))))
                    .collect()
            } else {
                deltas
                    .chain(std::iter::once(Ok(StreamChunk::new(
                        response.id.clone(),
                        response.model.clone(),
                    )
                    .with_finish_reason(FinishReason::Stop))))
                    .collect()
            };

            Ok(Box::pin(stream::iter(chunks)))
        }

        async fn list_models(&self) -> Result<Vec<ModelDescriptor>, DomainError> {
            Ok(vec![ModelDescriptor::new("mock-model")])
        }

        fn provider_name(&self) -> &str {
            &self.name
        }

        fn default_options(&self) -> LlmOptions {
            self.defaults.clone()
        }
    }
}
