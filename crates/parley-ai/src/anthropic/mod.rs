//! Anthropic Messages API client.
//!
//! Implements `ChatProvider` for Claude models via
//! `POST {base_url}/messages`, authenticated with an `x-api-key` header.

mod api;
mod client;
mod config;

pub use client::AnthropicClient;
pub use config::AnthropicConfig;

#[cfg(test)]
mod tests;
