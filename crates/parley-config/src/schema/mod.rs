//! Configuration schema.
//!
//! All sections carry `#[serde(default)]` so a partial file only needs the
//! keys it overrides.

mod orchestrator;
mod providers;
mod system;

pub use orchestrator::OrchestratorConfig;
pub use providers::{BackendConfig, ProvidersConfig};
pub use system::{DirectoryConfig, LogLevel, LoggingConfig};

use serde::{Deserialize, Serialize};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Top-level config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub providers: ProvidersConfig,
    pub orchestrator: OrchestratorConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: ParleyConfig = toml::from_str("").unwrap();
        assert_eq!(config.providers.preference, vec!["gemini", "openai", "anthropic"]);
        assert_eq!(config.providers.max_retries, 2);
        assert_eq!(config.orchestrator.tool_timeout_secs, 30);
        assert!(!config.orchestrator.parallel_tool_calls);
        assert!(config.directory.base_url.is_empty());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn nested_backend_tables_parse() {
        let config: ParleyConfig = toml::from_str(
            r#"
[providers]
preference = ["anthropic"]

[providers.anthropic]
model = "claude-3-5-haiku-latest"
max_tokens = 2048

[logging]
level = "debug"
"#,
        )
        .unwrap();
        assert_eq!(config.providers.preference, vec!["anthropic"]);
        assert_eq!(
            config.providers.anthropic.model.as_deref(),
            Some("claude-3-5-haiku-latest")
        );
        assert_eq!(config.providers.anthropic.max_tokens, 2048);
        assert_eq!(config.providers.anthropic.temperature, 0.7);
        assert!(config.providers.openai.model.is_none());
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
