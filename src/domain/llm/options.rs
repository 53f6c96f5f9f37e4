//! Generation options and their override layering

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Generation options sent alongside a chat request.
///
/// Options are layered with a fixed precedence: call-site overrides beat
/// agent-level options, which beat the provider's defaults. A `None` field
/// never overrides a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

impl LlmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = Some(system_message.into());
        self
    }

    /// Overlay `overrides` on top of `self`; set fields in `overrides` win.
    pub fn merge(self, overrides: &LlmOptions) -> Self {
        Self {
            model: overrides.model.clone().or(self.model),
            temperature: overrides.temperature.or(self.temperature),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            top_p: overrides.top_p.or(self.top_p),
            stop: overrides.stop.clone().or(self.stop),
            presence_penalty: overrides.presence_penalty.or(self.presence_penalty),
            frequency_penalty: overrides.frequency_penalty.or(self.frequency_penalty),
            system_message: overrides.system_message.clone().or(self.system_message),
        }
    }

    /// Resolve the effective options: call-site > agent > provider default
    pub fn layered(provider_default: &LlmOptions, agent: &LlmOptions, call_site: &LlmOptions) -> Self {
        provider_default.clone().merge(agent).merge(call_site)
    }

    /// Check numeric ranges once, at construction time
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(DomainError::validation(format!(
                    "temperature must be between 0 and 2, got {}",
                    temperature
                )));
            }
        }

        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(DomainError::validation(format!(
                    "top_p must be between 0 and 1, got {}",
                    top_p
                )));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(DomainError::validation("max_tokens must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layered_precedence() {
        let provider = LlmOptions::new()
            .with_model("provider-model")
            .with_temperature(1.0)
            .with_max_tokens(256);
        let agent = LlmOptions::new().with_model("agent-model").with_temperature(0.3);
        let call_site = LlmOptions::new().with_temperature(0.9);

        let options = LlmOptions::layered(&provider, &agent, &call_site);

        assert_eq!(options.model.as_deref(), Some("agent-model"));
        assert_eq!(options.temperature, Some(0.9));
        assert_eq!(options.max_tokens, Some(256));
    }

    #[test]
    fn test_merge_keeps_lower_layer_when_unset() {
        let base = LlmOptions::new().with_system_message("base");
        let merged = base.merge(&LlmOptions::new());
        assert_eq!(merged.system_message.as_deref(), Some("base"));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(LlmOptions::new().with_temperature(2.5).validate().is_err());
        assert!(LlmOptions::new().with_top_p(1.5).validate().is_err());
        assert!(LlmOptions::new().with_max_tokens(0).validate().is_err());
        assert!(LlmOptions::new().with_temperature(0.7).validate().is_ok());
    }
}
