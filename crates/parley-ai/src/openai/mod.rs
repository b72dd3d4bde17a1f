//! OpenAI Chat Completions client.
//!
//! Implements `ChatProvider` against `POST {base_url}/chat/completions`
//! with bearer authentication. Any OpenAI-compatible endpoint works by
//! pointing `base_url` at it.

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
