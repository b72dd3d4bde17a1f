//! Orchestrator and directory validation.

use super::helpers::{validate_http_url, validate_range};
use crate::schema::ParleyConfig;

pub(super) fn validate_orchestrator(errors: &mut Vec<String>, config: &ParleyConfig) {
    let o = &config.orchestrator;
    if o.fallback_text.trim().is_empty() {
        errors.push("orchestrator.fallback_text must not be empty".into());
    }
    validate_range(errors, "orchestrator.tool_timeout_secs", o.tool_timeout_secs, 0, 3600);
}

pub(super) fn validate_directory(errors: &mut Vec<String>, config: &ParleyConfig) {
    let d = &config.directory;
    if !d.base_url.is_empty() {
        validate_http_url(errors, "directory.base_url", &d.base_url);
    }
    validate_range(errors, "directory.timeout_secs", d.timeout_secs, 1, 300);
}
