use super::ToolRegistry;
use crate::domain::llm::Message;

/// Conversation state owned by one agent
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    /// Retained messages, replayed when memory is enabled
    pub messages: Vec<Message>,
    pub tools: ToolRegistry,
}

impl AgentContext {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            messages: Vec::new(),
            tools,
        }
    }

    /// The last `size` retained messages
    pub fn window(&self, size: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(size);
        &self.messages[start..]
    }

    /// Replace the retained history with a finished turn and its answer
    pub fn remember(&mut self, turn: Vec<Message>, answer: impl Into<String>) {
        self.messages = turn;
        self.messages.push(Message::assistant(answer));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
