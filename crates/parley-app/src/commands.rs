//! Subcommand handlers.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use parley_ai::{
    CancellationToken, ChatError, ChatProvider, ChatResult, FinishReason, Orchestrator, Transcript,
};
use parley_common::{new_correlation_id, SessionId};
use parley_config::{Credentials, ParleyConfig};
use parley_directory::{UserDirectory, UserQuery};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Instrument};

use crate::mcp::{self, ToolServer};
use crate::wiring;

fn seed_transcript(config: &ParleyConfig) -> Transcript {
    let prompt = config.orchestrator.system_prompt.trim();
    if prompt.is_empty() {
        Transcript::new()
    } else {
        Transcript::with_system(prompt)
    }
}

/// Routes Ctrl-C to the running chat, if any.
#[derive(Clone, Default)]
struct Interrupts {
    running: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Listen for Ctrl-C for the rest of the process. With no chat running
    /// the process exits, as it would without a handler.
    fn install() -> Self {
        let interrupts = Self::default();
        let listener = interrupts.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !listener.interrupt() {
                    std::process::exit(130);
                }
            }
        });
        interrupts
    }

    fn begin(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut running) = self.running.lock() {
            *running = Some(token.clone());
        }
        token
    }

    fn end(&self) {
        if let Ok(mut running) = self.running.lock() {
            *running = None;
        }
    }

    /// Cancel the running chat. False when nothing was running.
    fn interrupt(&self) -> bool {
        match self.running.lock().ok().and_then(|running| running.clone()) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

/// One orchestration that Ctrl-C cancels instead of killing the process.
async fn chat_once(
    orchestrator: &Orchestrator,
    transcript: &mut Transcript,
    model: Option<&str>,
    interrupts: &Interrupts,
) -> Result<ChatResult, ChatError> {
    let cancel = interrupts.begin();
    let span = tracing::info_span!("chat", id = %new_correlation_id());
    let result = orchestrator
        .handle_chat_with_cancel(transcript, model, &cancel)
        .instrument(span)
        .await;
    interrupts.end();
    result
}

fn report(result: &ChatResult) {
    info!(
        finish_reason = %result.finish_reason,
        tool_called = result.tool_called,
        tokens = result.usage.total_tokens(),
        "Chat finished"
    );
    if result.finish_reason == FinishReason::ToolError {
        warn!("At least one tool call failed");
    }
}

pub async fn chat(
    config: &ParleyConfig,
    credentials: &Credentials,
    message: &str,
    model: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    credentials.require_any()?;
    let orchestrator = wiring::build_orchestrator(config, credentials)?;
    let mut transcript = seed_transcript(config);
    transcript.push_user(message);

    let result = chat_once(&orchestrator, &mut transcript, model, &Interrupts::install()).await?;
    report(&result);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.content);
    }
    Ok(())
}

pub async fn repl(
    config: &ParleyConfig,
    credentials: &Credentials,
    model: Option<&str>,
) -> anyhow::Result<()> {
    credentials.require_any()?;
    let orchestrator = wiring::build_orchestrator(config, credentials)?;

    let session = SessionId::new();
    info!(session = %session, "Starting REPL");
    println!(
        "Type a message. Ctrl-C cancels a reply (or quits at the prompt), /reset starts over."
    );

    let interrupts = Interrupts::install();
    let mut transcript = seed_transcript(config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/exit" | "/quit" => break,
            "/reset" => {
                transcript = seed_transcript(config);
                println!("(conversation cleared)");
                continue;
            }
            _ => {}
        }

        transcript.push_user(line);
        let result = chat_once(&orchestrator, &mut transcript, model, &interrupts)
            .instrument(tracing::info_span!("repl", session = %session))
            .await?;
        report(&result);
        println!("{}\n", result.content);
        // Error replies are not the model's words; keep them out of the history.
        if result.finish_reason != FinishReason::Error {
            transcript.push_assistant(result.content);
        }
    }
    Ok(())
}

pub async fn search(config: &ParleyConfig, query: UserQuery) -> anyhow::Result<()> {
    let directory = wiring::build_directory(&config.directory)?;
    let page = directory.search(&query).await?;

    println!("Found {} users (showing {})", page.total, page.items.len());
    for user in &page.items {
        println!("{:<6} {:<24} {:<36} {}", user.id, user.name, user.email, user.role);
    }
    Ok(())
}

/// No provider is involved, so no API key is needed.
pub async fn mcp(config: &ParleyConfig) -> anyhow::Result<()> {
    let registry = wiring::build_registry(wiring::build_directory(&config.directory)?)?;
    let options = wiring::orchestrator_options(&config.orchestrator);
    mcp::serve_stdio(ToolServer::new(Arc::new(registry), options.tool_timeout)).await
}

pub fn status(
    config: &ParleyConfig,
    credentials: &Credentials,
    show_config: bool,
) -> anyhow::Result<()> {
    let router = wiring::build_router(config, credentials)?;

    println!("Provider preference:");
    for provider in router.preference() {
        let state = match router.client(*provider) {
            Some(client) => format!("ready ({})", client.default_model()),
            None => "no API key".to_string(),
        };
        println!("  {provider:<10} {state}");
    }
    match router.select() {
        Some((provider, _)) => println!("Active provider: {provider}"),
        None => println!("Active provider: none (set an API key)"),
    }

    let directory = if config.directory.base_url.is_empty() {
        "bundled demo data".to_string()
    } else {
        config.directory.base_url.clone()
    };
    println!("User directory: {directory}");

    if show_config {
        println!("{}", parley_config::config_to_json(config));
    }
    Ok(())
}
