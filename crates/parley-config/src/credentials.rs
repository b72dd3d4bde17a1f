//! API keys for the provider backends, read from the environment.

use std::fmt;

use parley_common::ConfigError;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Backend API keys. Blank values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub openai: Option<String>,
    pub gemini: Option<String>,
    pub anthropic: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (environment, test fixture, secret store).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            openai: read(OPENAI_API_KEY),
            gemini: read(GEMINI_API_KEY),
            anthropic: read(ANTHROPIC_API_KEY),
        }
    }

    pub fn has_any(&self) -> bool {
        self.openai.is_some() || self.gemini.is_some() || self.anthropic.is_some()
    }

    /// Fail unless at least one backend key is set.
    pub fn require_any(&self) -> Result<(), ConfigError> {
        if self.has_any() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredential(format!(
                "set one of {OPENAI_API_KEY}, {GEMINI_API_KEY} or {ANTHROPIC_API_KEY}"
            )))
        }
    }
}

fn presence(key: &Option<String>) -> &'static str {
    if key.is_some() {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("openai", &presence(&self.openai))
            .field("gemini", &presence(&self.gemini))
            .field("anthropic", &presence(&self.anthropic))
            .finish()
    }
}
