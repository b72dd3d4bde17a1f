//! Full configuration validation.
//!
//! Each section has its own validator; this collects every error into a
//! single `ConfigError` so one run reports everything that is wrong.

mod helpers;
mod misc;
mod providers;


pub use providers::KNOWN_PROVIDERS;

use crate::schema::ParleyConfig;
use parley_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParleyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    providers::validate_providers(&mut errors, config);
    misc::validate_orchestrator(&mut errors, config);
    misc::validate_directory(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
