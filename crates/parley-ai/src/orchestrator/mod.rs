//! Two-phase tool-calling orchestration.
//!
//! One `handle_chat` call runs: completion with every registered tool
//! offered, then (only if the model asked for tools) execution of each
//! request and a follow-up completion with no tools offered.

mod chat;
mod manager;
mod types;

pub use manager::Orchestrator;
pub use types::{ChatError, ChatResult, OrchestratorOptions, Phase, DEFAULT_FALLBACK_TEXT};
