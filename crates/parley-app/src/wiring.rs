//! Turns config and credentials into providers, tools and an orchestrator.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parley_ai::{
    AnthropicClient, AnthropicConfig, GeminiClient, GeminiConfig, OpenAiClient, OpenAiConfig,
    Orchestrator, OrchestratorOptions, Provider, ProviderRouter, RetryPolicy, RetryingProvider,
    ToolRegistry,
};
use parley_config::{
    Credentials, DirectoryConfig, OrchestratorConfig, ParleyConfig, ProvidersConfig,
};
use parley_directory::{HttpDirectory, InMemoryDirectory, SearchUsersTool, UserDirectory};
use tracing::info;

pub fn retry_policy(providers: &ProvidersConfig) -> RetryPolicy {
    RetryPolicy {
        max_retries: providers.max_retries,
        initial_backoff: Duration::from_millis(u64::from(providers.retry_backoff_ms)),
        ..RetryPolicy::default()
    }
}

pub fn orchestrator_options(config: &OrchestratorConfig) -> OrchestratorOptions {
    OrchestratorOptions {
        fallback_text: config.fallback_text.clone(),
        tool_timeout: (config.tool_timeout_secs > 0)
            .then(|| Duration::from_secs(u64::from(config.tool_timeout_secs))),
        parallel_tool_calls: config.parallel_tool_calls,
    }
}

/// Register a retrying client for every backend that has a key.
pub fn build_router(
    config: &ParleyConfig,
    credentials: &Credentials,
) -> anyhow::Result<ProviderRouter> {
    let p = &config.providers;
    let preference = p
        .preference
        .iter()
        .map(|name| Provider::from_str(name))
        .collect::<Result<Vec<_>, _>>()?;
    let mut router = ProviderRouter::with_preference(preference);

    let connect = Duration::from_secs(u64::from(p.connect_timeout_secs));
    let request = Duration::from_secs(u64::from(p.request_timeout_secs));
    let policy = retry_policy(p);

    if let Some(key) = &credentials.openai {
        let mut cfg = OpenAiConfig::new(key)
            .with_max_tokens(p.openai.max_tokens)
            .with_temperature(p.openai.temperature)
            .with_timeouts(connect, request);
        if let Some(model) = &p.openai.model {
            cfg = cfg.with_model(model);
        }
        if let Some(url) = &p.openai.base_url {
            cfg = cfg.with_base_url(url);
        }
        let client = OpenAiClient::new(cfg).context("building OpenAI client")?;
        router.register(Provider::OpenAi, Arc::new(RetryingProvider::new(client, policy)));
    }

    if let Some(key) = &credentials.gemini {
        let mut cfg = GeminiConfig::new(key)
            .with_max_tokens(p.gemini.max_tokens)
            .with_temperature(p.gemini.temperature)
            .with_timeouts(connect, request);
        if let Some(model) = &p.gemini.model {
            cfg = cfg.with_model(model);
        }
        if let Some(url) = &p.gemini.base_url {
            cfg = cfg.with_base_url(url);
        }
        let client = GeminiClient::new(cfg).context("building Gemini client")?;
        router.register(Provider::Gemini, Arc::new(RetryingProvider::new(client, policy)));
    }

    if let Some(key) = &credentials.anthropic {
        let mut cfg = AnthropicConfig::new(key)
            .with_max_tokens(p.anthropic.max_tokens)
            .with_temperature(p.anthropic.temperature)
            .with_timeouts(connect, request);
        if let Some(model) = &p.anthropic.model {
            cfg = cfg.with_model(model);
        }
        if let Some(url) = &p.anthropic.base_url {
            cfg = cfg.with_base_url(url);
        }
        let client = AnthropicClient::new(cfg).context("building Anthropic client")?;
        router.register(Provider::Anthropic, Arc::new(RetryingProvider::new(client, policy)));
    }

    Ok(router)
}

/// Remote directory when a base URL is configured, bundled demo data otherwise.
pub fn build_directory(config: &DirectoryConfig) -> anyhow::Result<Arc<dyn UserDirectory>> {
    if config.base_url.is_empty() {
        info!("Using the bundled demo user directory");
        return Ok(Arc::new(InMemoryDirectory::demo()?));
    }
    info!(url = %config.base_url, "Using remote user directory");
    let timeout = Duration::from_secs(u64::from(config.timeout_secs));
    Ok(Arc::new(HttpDirectory::new(&config.base_url, timeout)?))
}

pub fn build_registry(directory: Arc<dyn UserDirectory>) -> anyhow::Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register_tool(SearchUsersTool::new(directory))?;
    Ok(registry)
}

pub fn build_orchestrator(
    config: &ParleyConfig,
    credentials: &Credentials,
) -> anyhow::Result<Orchestrator> {
    let router = build_router(config, credentials)?;
    let registry = build_registry(build_directory(&config.directory)?)?;
    Ok(Orchestrator::from_router(&router, Arc::new(registry))
        .with_options(orchestrator_options(&config.orchestrator)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_ai::ChatProvider;

    fn keys(openai: bool, gemini: bool, anthropic: bool) -> Credentials {
        Credentials {
            openai: openai.then(|| "sk-openai".to_string()),
            gemini: gemini.then(|| "gm-key".to_string()),
            anthropic: anthropic.then(|| "sk-ant".to_string()),
        }
    }

    #[test]
    fn zero_tool_timeout_disables_the_deadline() {
        let mut config = OrchestratorConfig::default();
        assert_eq!(
            orchestrator_options(&config).tool_timeout,
            Some(Duration::from_secs(30))
        );
        config.tool_timeout_secs = 0;
        assert!(orchestrator_options(&config).tool_timeout.is_none());
    }

    #[test]
    fn retry_policy_follows_config() {
        let mut providers = ProvidersConfig::default();
        providers.max_retries = 4;
        providers.retry_backoff_ms = 250;
        let policy = retry_policy(&providers);
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.backoff(1), Duration::from_millis(250));
        assert_eq!(policy.backoff(3), Duration::from_millis(1000));
    }

    #[test]
    fn only_backends_with_keys_are_registered() {
        let router = build_router(&ParleyConfig::default(), &keys(true, false, true)).unwrap();
        assert_eq!(router.available(), vec![Provider::OpenAi, Provider::Anthropic]);
        let (selected, client) = router.select().unwrap();
        assert_eq!(selected, Provider::OpenAi);
        assert_eq!(client.name(), "openai");
    }

    #[test]
    fn configured_preference_wins() {
        let mut config = ParleyConfig::default();
        config.providers.preference = vec!["claude".into(), "gemini".into()];
        let router = build_router(&config, &keys(true, true, true)).unwrap();
        assert_eq!(router.select().unwrap().0, Provider::Anthropic);
    }

    #[test]
    fn backend_overrides_reach_the_client() {
        let mut config = ParleyConfig::default();
        config.providers.gemini.model = Some("gemini-2.5-pro".into());
        let router = build_router(&config, &keys(false, true, false)).unwrap();
        let client = router.client(Provider::Gemini).unwrap();
        assert_eq!(client.default_model(), "gemini-2.5-pro");
    }

    #[test]
    fn no_keys_means_no_provider() {
        let router = build_router(&ParleyConfig::default(), &Credentials::default()).unwrap();
        assert!(router.select().is_none());
        let orchestrator =
            build_orchestrator(&ParleyConfig::default(), &Credentials::default()).unwrap();
        assert!(orchestrator.provider().is_none());
        assert_eq!(orchestrator.registry().len(), 1);
    }
}
