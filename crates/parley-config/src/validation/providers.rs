//! Provider section validation.

use std::collections::HashSet;

use super::helpers::{validate_http_url, validate_range, validate_range_f64};
use crate::schema::{BackendConfig, ParleyConfig};

/// Names accepted in `providers.preference`, aliases included.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "gemini", "google", "anthropic", "claude"];

fn canonical(name: &str) -> Option<&'static str> {
    match name.to_ascii_lowercase().as_str() {
        "openai" => Some("openai"),
        "gemini" | "google" => Some("gemini"),
        "anthropic" | "claude" => Some("anthropic"),
        _ => None,
    }
}

pub(super) fn validate_providers(errors: &mut Vec<String>, config: &ParleyConfig) {
    let p = &config.providers;

    if p.preference.is_empty() {
        errors.push("providers.preference must name at least one provider".into());
    }
    let mut seen = HashSet::new();
    for name in &p.preference {
        match canonical(name) {
            Some(id) if !seen.insert(id) => {
                errors.push(format!("providers.preference lists {id} more than once"));
            }
            Some(_) => {}
            None => errors.push(format!(
                "providers.preference: unknown provider {name:?} (expected one of {})",
                KNOWN_PROVIDERS.join(", ")
            )),
        }
    }

    validate_range(errors, "providers.request_timeout_secs", p.request_timeout_secs, 1, 600);
    validate_range(errors, "providers.connect_timeout_secs", p.connect_timeout_secs, 1, 120);
    validate_range(errors, "providers.max_retries", p.max_retries, 0, 10);
    validate_range(errors, "providers.retry_backoff_ms", p.retry_backoff_ms, 0, 60_000);

    validate_backend(errors, "openai", &p.openai);
    validate_backend(errors, "gemini", &p.gemini);
    validate_backend(errors, "anthropic", &p.anthropic);
}

fn validate_backend(errors: &mut Vec<String>, section: &str, backend: &BackendConfig) {
    validate_range(
        errors,
        &format!("providers.{section}.max_tokens"),
        backend.max_tokens,
        1,
        200_000,
    );
    validate_range_f64(
        errors,
        &format!("providers.{section}.temperature"),
        backend.temperature,
        0.0,
        2.0,
    );
    if let Some(model) = &backend.model {
        if model.trim().is_empty() {
            errors.push(format!("providers.{section}.model must not be blank"));
        }
    }
    if let Some(url) = &backend.base_url {
        validate_http_url(errors, &format!("providers.{section}.base_url"), url);
    }
}
