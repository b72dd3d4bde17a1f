//! Provider router: picks the backend an orchestrator talks to.
//!
//! Backends are registered once credentials are known; `select` walks the
//! preference list and returns the first registered one.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::ChatProvider;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Gemini,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Gemini, Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Anthropic => "anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" | "google" => Ok(Provider::Gemini),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Registered backends plus the order to try them in.
pub struct ProviderRouter {
    clients: HashMap<Provider, Arc<dyn ChatProvider>>,
    preference: Vec<Provider>,
}

impl ProviderRouter {
    /// Router with the default preference: gemini, openai, anthropic.
    pub fn new() -> Self {
        Self::with_preference(Provider::ALL.to_vec())
    }

    pub fn with_preference(preference: Vec<Provider>) -> Self {
        Self {
            clients: HashMap::new(),
            preference,
        }
    }

    pub fn register(&mut self, provider: Provider, client: Arc<dyn ChatProvider>) {
        self.clients.insert(provider, client);
    }

    pub fn client(&self, provider: Provider) -> Option<&Arc<dyn ChatProvider>> {
        self.clients.get(&provider)
    }

    pub fn preference(&self) -> &[Provider] {
        &self.preference
    }

    /// Registered providers in preference order.
    pub fn available(&self) -> Vec<Provider> {
        self.preference
            .iter()
            .copied()
            .filter(|p| self.clients.contains_key(p))
            .collect()
    }

    /// First registered provider in preference order.
    pub fn select(&self) -> Option<(Provider, Arc<dyn ChatProvider>)> {
        let chosen = self
            .preference
            .iter()
            .find_map(|p| self.clients.get(p).map(|c| (*p, Arc::clone(c))));
        match &chosen {
            Some((provider, client)) => {
                info!(provider = %provider, model = client.default_model(), "Selected LLM provider")
            }
            None => info!("No LLM provider available"),
        }
        chosen
    }
}

impl Default for ProviderRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ProviderError, ProviderResponse, ToolSpec, Transcript};
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl ChatProvider for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn default_model(&self) -> &str {
            "m"
        }

        async fn complete(
            &self,
            _transcript: &Transcript,
            _tools: &[ToolSpec],
            _model: Option<&str>,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse::text(self.0))
        }
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAi));
        assert_eq!(" gemini ".parse::<Provider>(), Ok(Provider::Gemini));
        assert_eq!("claude".parse::<Provider>(), Ok(Provider::Anthropic));
        assert!("mistral".parse::<Provider>().is_err());
        assert_eq!(Provider::Anthropic.to_string(), "anthropic");
    }

    #[test]
    fn default_preference_prefers_gemini() {
        let mut router = ProviderRouter::new();
        router.register(Provider::Anthropic, Arc::new(Named("anthropic")));
        router.register(Provider::OpenAi, Arc::new(Named("openai")));
        router.register(Provider::Gemini, Arc::new(Named("gemini")));

        let (provider, client) = router.select().unwrap();
        assert_eq!(provider, Provider::Gemini);
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn skips_unregistered_providers() {
        let mut router = ProviderRouter::new();
        router.register(Provider::Anthropic, Arc::new(Named("anthropic")));
        assert_eq!(router.select().unwrap().0, Provider::Anthropic);
        assert_eq!(router.available(), vec![Provider::Anthropic]);
    }

    #[test]
    fn custom_preference_and_empty_router() {
        let mut router = ProviderRouter::with_preference(vec![Provider::OpenAi]);
        assert!(router.select().is_none());

        router.register(Provider::Gemini, Arc::new(Named("gemini")));
        // Not in the preference list, so never chosen.
        assert!(router.select().is_none());

        router.register(Provider::OpenAi, Arc::new(Named("openai")));
        assert_eq!(router.select().unwrap().0, Provider::OpenAi);
    }
}
