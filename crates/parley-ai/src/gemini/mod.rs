//! Google Gemini API client.
//!
//! Implements `ChatProvider` via `generateContent`
//! (`{base_url}/models/{model}:generateContent`).

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;

#[cfg(test)]
mod tests;
