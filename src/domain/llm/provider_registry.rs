//! Name-keyed provider lookup for workflow runs

use std::collections::HashMap;
use std::sync::Arc;

use super::LlmProvider;

/// Immutable snapshot of the providers available to one workflow run.
///
/// The registry is assembled once with [`ProviderRegistryBuilder`] and then only
/// read, so a run never observes providers being added or removed mid-flight.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<HashMap<String, Arc<dyn LlmProvider>>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Registry holding a single provider under `id`
    pub fn single(id: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        Self::builder().provider(id, provider).build()
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(id).cloned()
    }

    /// Resolve the provider for a step.
    ///
    /// The step-level id wins when present; otherwise the workflow default is used.
    /// A step-level id that is not registered does not fall through to the default.
    pub fn resolve(
        &self,
        step_provider: Option<&str>,
        default_provider: Option<&str>,
    ) -> Option<Arc<dyn LlmProvider>> {
        step_provider.or(default_provider).and_then(|id| self.get(id))
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Builder for [`ProviderRegistry`]
#[derive(Debug, Default)]
pub struct ProviderRegistryBuilder {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistryBuilder {
    /// Add a provider; a later registration under the same id replaces the earlier one
    pub fn provider(mut self, id: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        self.providers.insert(id.into(), provider);
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: Arc::new(self.providers),
        }
    }
}
