use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use super::agent_impl::Agent;
use super::stream::AgentStream;
use crate::domain::agent::{AgentConfig, AgentError, Tool, ToolRegistry};
use crate::domain::llm::LlmProvider;

/// Name-keyed agents sharing one provider
#[derive(Debug)]
pub struct AgentManager {
    provider: Arc<dyn LlmProvider>,
    agents: BTreeMap<String, Agent>,
    tools: ToolRegistry,
}

impl AgentManager {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            agents: BTreeMap::new(),
            tools: ToolRegistry::new(),
        }
    }

    pub fn create_agent(
        &mut self,
        name: impl Into<String>,
        config: AgentConfig,
    ) -> Result<&mut Agent, AgentError> {
        match self.agents.entry(name.into()) {
            Entry::Occupied(entry) => Err(AgentError::agent_already_exists(entry.key())),
            Entry::Vacant(entry) => {
                let agent = Agent::new(config, self.provider.clone())?;
                info!(agent = %entry.key(), "Agent created");
                Ok(entry.insert(agent))
            }
        }
    }

    pub fn get_agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    pub fn get_agent_mut(&mut self, name: &str) -> Option<&mut Agent> {
        self.agents.get_mut(name)
    }

    pub fn remove_agent(&mut self, name: &str) -> bool {
        self.agents.remove(name).is_some()
    }

    pub fn list_agents(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// Register a shared tool and add it to every existing agent
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) {
        for agent in self.agents.values_mut() {
            agent.add_tool(tool.clone());
        }
        self.tools.register_arc(tool);
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.names()
    }

    pub async fn chat(&mut self, name: &str, message: &str) -> Result<String, AgentError> {
        self.agent_mut(name)?.chat(message).await
    }

    pub fn stream_chat(&mut self, name: &str, message: &str) -> Result<AgentStream<'_>, AgentError> {
        Ok(self.agent_mut(name)?.stream_chat(message))
    }

    fn agent_mut(&mut self, name: &str) -> Result<&mut Agent, AgentError> {
        self.agents
            .get_mut(name)
            .ok_or_else(|| AgentError::agent_not_found(name))
    }
}
