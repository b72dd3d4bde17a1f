//! Provider backends and the transport settings they share.

use serde::{Deserialize, Serialize};

/// Per-backend request settings. `None` means the adapter's own default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Valid range: 1-200000.
    pub max_tokens: u32,
    /// Valid range: 0.0-2.0.
    pub temperature: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: None,
            base_url: None,
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// `[providers]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Backends in the order they are tried; the first with a key wins.
    pub preference: Vec<String>,
    /// Valid range: 1-600.
    pub request_timeout_secs: u32,
    /// Valid range: 1-120.
    pub connect_timeout_secs: u32,
    /// Retries on transient failures (valid range: 0-10).
    pub max_retries: u32,
    /// Initial backoff, doubled per attempt (valid range: 0-60000).
    pub retry_backoff_ms: u32,
    pub openai: BackendConfig,
    pub gemini: BackendConfig,
    pub anthropic: BackendConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            preference: vec!["gemini".into(), "openai".into(), "anthropic".into()],
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 500,
            openai: BackendConfig::default(),
            gemini: BackendConfig::default(),
            anthropic: BackendConfig::default(),
        }
    }
}
