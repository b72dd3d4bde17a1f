//! Parley configuration system.
//!
//! TOML-based configuration with validation. Every section uses defaults,
//! so a partial (or empty) file works out of the box. API keys never live
//! in the file; they come from the environment via [`Credentials`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use parley_config::{config_to_json, load_config};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod credentials;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use credentials::Credentials;
pub use schema::{
    BackendConfig, DirectoryConfig, LogLevel, LoggingConfig, OrchestratorConfig, ParleyConfig,
    ProvidersConfig, CONFIG_SCHEMA_VERSION,
};

use parley_common::ConfigError;
use std::path::Path;

/// Load and validate the config.
///
/// With an explicit `path` the file must exist. Without one, the platform
/// default is used and created with documented defaults if missing.
pub fn load_config(path: Option<&Path>) -> Result<ParleyConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ParleyConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
