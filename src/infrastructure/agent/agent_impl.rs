//! Bounded tool-calling agent loop

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::builder::AgentBuilder;
use super::stream::AgentStream;
use crate::domain::agent::{AgentConfig, AgentContext, AgentError, Tool, ToolRegistry};
use crate::domain::llm::{LlmOptions, LlmProvider, LlmRequest, LlmResponse, Message, ToolCall};

/// Text returned when the model produced neither content nor a refusal
pub const NO_RESPONSE: &str = "No response generated";

/// An agent converses with one provider and may invoke its tools.
///
/// Each `chat` call runs a loop bounded by `max_iterations` and
/// `max_execution_time`. Tool-call turns never end the loop; only a response
/// without tool calls does.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    provider: Arc<dyn LlmProvider>,
    context: AgentContext,
}

impl Agent {
    /// Create an agent, validating its configuration
    pub fn new(config: AgentConfig, provider: Arc<dyn LlmProvider>) -> Result<Self, AgentError> {
        config.validate()?;

        Ok(Self {
            config,
            provider,
            context: AgentContext::default(),
        })
    }

    pub fn builder(
        role: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> AgentBuilder {
        AgentBuilder::new(role, goal, backstory)
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.context.tools = tools;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.context.tools
    }

    /// Retained conversation history
    pub fn history(&self) -> &[Message] {
        &self.context.messages
    }

    pub fn clear_memory(&mut self) {
        self.context.clear();
    }

    /// Add a tool, replacing any tool with the same name
    pub fn add_tool(&mut self, tool: Arc<dyn Tool>) {
        self.context.tools.register_arc(tool);
    }

    pub fn remove_tool(&mut self, name: &str) -> bool {
        self.context.tools.remove(name)
    }

    pub async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, AgentError> {
        self.context.tools.execute(name, arguments).await
    }

    pub fn system_prompt(&self) -> String {
        self.config
            .system_prompt_with(&self.context.tools.descriptions())
    }

    /// Run the loop until the model answers without tool calls
    pub async fn chat(&mut self, message: &str) -> Result<String, AgentError> {
        let start = Instant::now();
        let max_iterations = self.config.max_iterations;
        let mut turn = self.opening_messages(message);
        let mut iterations = 0;

        while iterations < max_iterations {
            self.check_time(start)?;

            debug!(
                iteration = iterations + 1,
                messages = turn.len(),
                "Calling provider"
            );

            let response = self
                .provider
                .chat(self.build_request(turn.clone(), false))
                .await?;

            if response.has_tool_calls() {
                for call in &response.tool_calls {
                    let result = self.run_tool_call(call).await?;
                    turn.push(Message::assistant(result));
                }
                iterations += 1;
                continue;
            }

            let text = Self::response_text(&response);

            self.remember(turn, text.clone());

            info!(iterations = iterations + 1, "Agent answered");
            return Ok(text);
        }

        warn!(max_iterations = max_iterations, "Agent exhausted its iterations");
        Err(AgentError::iteration_limit(max_iterations))
    }

    /// Stream the answer as text fragments; see [`AgentStream`]
    pub fn stream_chat(&mut self, message: &str) -> AgentStream<'_> {
        let turn = self.opening_messages(message);
        AgentStream::new(self, turn)
    }

    /// Retained window (when memory is on) followed by the new user message
    pub(super) fn opening_messages(&self, message: &str) -> Vec<Message> {
        let mut messages = if self.config.memory {
            self.context.window(self.config.memory_window).to_vec()
        } else {
            Vec::new()
        };
        messages.push(Message::user(message));
        messages
    }

    pub(super) fn build_request(&self, messages: Vec<Message>, stream: bool) -> LlmRequest {
        let call_site = LlmOptions::new().with_system_message(self.system_prompt());
        let options = LlmOptions::layered(
            &self.provider.default_options(),
            &self.config.llm_options,
            &call_site,
        );

        let mut builder = LlmRequest::builder()
            .messages(messages)
            .options(options)
            .stream(stream);

        if !self.context.tools.is_empty() {
            builder = builder
                .tools(self.context.tools.definitions())
                .tool_choice(self.config.tool_choice.clone());
        }

        builder.build()
    }

    pub(super) fn check_time(&self, start: Instant) -> Result<(), AgentError> {
        if start.elapsed() >= self.config.max_execution_time {
            warn!("Agent exceeded its execution time");
            return Err(AgentError::time_limit(
                self.config.max_execution_time.as_secs(),
            ));
        }
        Ok(())
    }

    pub(super) fn remember(&mut self, turn: Vec<Message>, answer: String) {
        if self.config.memory {
            self.context.remember(turn, answer);
        }
    }

    async fn run_tool_call(&self, call: &ToolCall) -> Result<String, AgentError> {
        let arguments = Self::parse_arguments(call)?;
        let result = self.execute_tool(&call.name, arguments).await?;

        serde_json::to_string(&result)
            .map_err(|e| AgentError::tool_execution(&call.name, e.to_string()))
    }

    /// Parse a tool call's JSON argument payload; an empty payload means `{}`
    pub fn parse_arguments(call: &ToolCall) -> Result<Value, AgentError> {
        if call.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        serde_json::from_str(&call.arguments)
            .map_err(|e| AgentError::invalid_tool_arguments(&call.name, e.to_string()))
    }

    /// Text of a final response: content, then refusal, then [`NO_RESPONSE`]
    pub fn response_text(response: &LlmResponse) -> String {
        if let Some(content) = response.content() {
            return content.to_string();
        }

        match response.refusal.as_deref() {
            Some(refusal) if !refusal.is_empty() => format!("Refusal: {}", refusal),
            _ => NO_RESPONSE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::FunctionTool;
    use crate::domain::llm::mock::{text_response, tool_call_response};
    use crate::domain::llm::{MessageRole, MockLlmProvider, ToolChoice};
    use crate::domain::DomainError;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    // Records every invocation of the "add" tool
    #[derive(Debug, Default)]
    struct AddTool {
        calls: AtomicUsize,
        seen: Mutex<Vec<Value>>,
    }

    #[async_trait::async_trait]
    impl Tool for AddTool {
        fn name(&self) -> &str {
            "add"
        }

        fn description(&self) -> &str {
            "Add two numbers"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"a": {}, "b": {}}})
        }

        async fn execute(&self, arguments: Value) -> Result<Value, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(arguments.clone());
            let a = arguments["a"].as_i64().unwrap_or_default();
            let b = arguments["b"].as_i64().unwrap_or_default();
            Ok(json!({"sum": a + b}))
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::new("Calculator", "Do arithmetic", "Precise")
    }

    fn new_agent(provider: Arc<MockLlmProvider>, config: AgentConfig) -> Agent {
        Agent::new(config, provider).unwrap()
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_text("Four."));
        let mut agent = new_agent(provider.clone(), config());

        let answer = agent.chat("2+2?").await.unwrap();

        assert_eq!(answer, "Four.");
        assert_eq!(provider.call_count(), 1);
        assert!(agent.history().is_empty());

        let request = &provider.requests()[0];
        assert_eq!(request.messages, vec![Message::user("2+2?")]);
        assert!(!request.has_tools());
        assert_eq!(request.tool_choice, None);
    }

    #[tokio::test]
    async fn test_tool_call_round_trip() {
        let provider = Arc::new(
            MockLlmProvider::new("mock")
                .with_response(tool_call_response("add", r#"{"a":2,"b":3}"#))
                .with_text("The sum is 5"),
        );
        let tool = Arc::new(AddTool::default());
        let mut agent = new_agent(provider.clone(), config());
        agent.add_tool(tool.clone());

        let answer = agent.chat("What is 2+3?").await.unwrap();

        assert_eq!(answer, "The sum is 5");
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
        assert_eq!(tool.seen.lock().unwrap()[0], json!({"a": 2, "b": 3}));

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[1].messages.len(),
            requests[0].messages.len() + 1
        );
        let appended = requests[1].messages.last().unwrap();
        assert_eq!(appended.role, MessageRole::Assistant);
        assert_eq!(appended.content_text(), r#"{"sum":5}"#);

        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].name, "add");
        assert_eq!(requests[0].tool_choice, Some(ToolChoice::Auto));
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let provider = Arc::new(
            MockLlmProvider::new("mock").with_response(tool_call_response("add", r#"{"a":1,"b":1}"#)),
        );
        let mut config = config();
        config.max_iterations = 1;
        let mut agent = new_agent(provider.clone(), config);
        agent.add_tool(Arc::new(AddTool::default()));

        let err = agent.chat("loop").await.unwrap_err();

        assert_eq!(err, AgentError::IterationLimitExceeded { max_iterations: 1 });
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_time_limit_before_any_call() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_text("never"));
        let mut config = config();
        config.max_execution_time = Duration::ZERO;
        let mut agent = new_agent(provider.clone(), config);

        let err = agent.chat("hello").await.unwrap_err();

        assert_eq!(err, AgentError::TimeLimitExceeded { seconds: 0 });
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_memory_replays_window() {
        let provider = Arc::new(
            MockLlmProvider::new("mock")
                .with_text("first answer")
                .with_text("second answer"),
        );
        let mut config = config();
        config.memory = true;
        config.memory_window = 2;
        let mut agent = new_agent(provider.clone(), config);

        agent.chat("first").await.unwrap();
        assert_eq!(
            agent.history(),
            &[Message::user("first"), Message::assistant("first answer")]
        );

        agent.chat("second").await.unwrap();

        let requests = provider.requests();
        assert_eq!(
            requests[1].messages,
            vec![
                Message::user("first"),
                Message::assistant("first answer"),
                Message::user("second"),
            ]
        );
        assert_eq!(agent.history().len(), 4);

        agent.clear_memory();
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn test_refusal_and_empty_response() {
        let refusal = text_response("").with_refusal("cannot help");
        let provider = Arc::new(
            MockLlmProvider::new("mock")
                .with_response(refusal)
                .with_response(text_response("")),
        );
        let mut agent = new_agent(provider, config());

        assert_eq!(agent.chat("a").await.unwrap(), "Refusal: cannot help");
        assert_eq!(agent.chat("b").await.unwrap(), NO_RESPONSE);
    }

    #[tokio::test]
    async fn test_tool_errors_abort_the_call() {
        let failing = FunctionTool::new("fail", "Always fails", json!({}), |_| async {
            Err::<Value, _>(DomainError::tool("fail", "boom"))
        });
        let provider = Arc::new(
            MockLlmProvider::new("mock").with_response(tool_call_response("fail", "{}")),
        );
        let mut agent = new_agent(provider.clone(), config());
        agent.add_tool(Arc::new(failing));

        let err = agent.chat("go").await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution { ref tool, .. } if tool == "fail"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments() {
        let provider = Arc::new(
            MockLlmProvider::new("mock").with_response(tool_call_response("missing", "{}")),
        );
        let mut agent = new_agent(provider, config());
        assert_eq!(
            agent.chat("go").await.unwrap_err(),
            AgentError::ToolNotFound("missing".to_string())
        );

        let provider = Arc::new(
            MockLlmProvider::new("mock").with_response(tool_call_response("add", "{not json")),
        );
        let mut agent = new_agent(provider, config());
        agent.add_tool(Arc::new(AddTool::default()));
        assert!(matches!(
            agent.chat("go").await.unwrap_err(),
            AgentError::InvalidToolArguments { .. }
        ));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_error("unavailable"));
        let mut agent = new_agent(provider, config());

        let err = agent.chat("hi").await.unwrap_err();
        assert_eq!(
            err,
            AgentError::Provider(DomainError::provider("mock", "unavailable"))
        );
    }

    #[test]
    fn test_options_layering_and_system_prompt() {
        let provider = Arc::new(MockLlmProvider::new("mock").with_default_options(
            LlmOptions::new()
                .with_model("provider-model")
                .with_max_tokens(256)
                .with_system_message("provider system"),
        ));
        let mut config = config();
        config.llm_options = LlmOptions::new().with_model("agent-model");
        config.system_prompt = Some("Show your work.".to_string());

        let mut agent = new_agent(provider, config);
        agent.add_tool(Arc::new(AddTool::default()));

        let request = agent.build_request(vec![Message::user("x")], false);

        assert_eq!(request.options.model.as_deref(), Some("agent-model"));
        assert_eq!(request.options.max_tokens, Some(256));
        assert_eq!(
            request.options.system_message.as_deref(),
            Some(
                "Role: Calculator\nGoal: Do arithmetic\nBackstory: Precise\n\n\
                 Available Tools:\nadd: Add two numbers\n\nShow your work."
            )
        );
    }

    #[test]
    fn test_parse_arguments() {
        let empty = ToolCall::new("1", "add", "  ");
        assert_eq!(Agent::parse_arguments(&empty).unwrap(), json!({}));

        let call = ToolCall::new("2", "add", r#"{"a":2}"#);
        assert_eq!(Agent::parse_arguments(&call).unwrap(), json!({"a": 2}));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let provider = Arc::new(MockLlmProvider::new("mock"));
        let mut config = config();
        config.max_iterations = 0;
        assert!(matches!(
            Agent::new(config, provider),
            Err(AgentError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_add_and_remove_tool() {
        let provider = Arc::new(MockLlmProvider::new("mock"));
        let mut agent = new_agent(provider, config());
        agent.add_tool(Arc::new(AddTool::default()));

        assert_eq!(
            agent.execute_tool("add", json!({"a": 1, "b": 2})).await.unwrap(),
            json!({"sum": 3})
        );
        assert!(agent.remove_tool("add"));
        assert!(!agent.remove_tool("add"));
        assert!(agent.tools().is_empty());
    }
}
