mod cli;
mod commands;
mod mcp;
mod wiring;

use anyhow::Context;
use parley_config::{Credentials, ParleyConfig};
use parley_directory::UserQuery;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};

/// `--log-level` wins, then `RUST_LOG`, then `[logging] level` from the config.
fn log_filter(args: &Args, config: &ParleyConfig) -> EnvFilter {
    if let Some(directive) = &args.log_level {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("ignoring invalid --log-level {directive:?}: {e}"),
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("parley={}", config.logging.level.as_filter()))
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; keys may already be in the environment.
    let dotenv = dotenvy::dotenv();

    let args = cli::parse();
    let config = parley_config::load_config(args.config.as_deref()).context("loading config")?;

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&args, &config))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Parley v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }
    let credentials = Credentials::from_env();
    tracing::debug!(?credentials, "Credentials resolved");

    let model = args.model.as_deref();
    match args.command {
        Command::Chat { message, json } => {
            commands::chat(&config, &credentials, &message, model, json).await
        }
        Command::Repl => commands::repl(&config, &credentials, model).await,
        Command::Search {
            query,
            role,
            limit,
            offset,
        } => {
            let query = UserQuery {
                query,
                role,
                limit,
                offset,
            };
            commands::search(&config, query).await
        }
        Command::Mcp => commands::mcp(&config).await,
        Command::Status { show_config } => commands::status(&config, &credentials, show_config),
    }
}
