use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parley: tool-calling chat over OpenAI, Gemini or Anthropic.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. `debug`, `parley_ai=trace`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Model hint passed to the selected provider.
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one message and print the reply.
    Chat {
        message: String,
        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive conversation; each reply seeds the next turn.
    Repl,
    /// Query the user directory directly, without a model.
    Search {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        role: Option<String>,
        #[arg(short, long, default_value_t = parley_directory::DEFAULT_LIMIT)]
        limit: usize,
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
    },
    /// Serve the registered tools to an MCP client over stdin/stdout.
    Mcp,
    /// Show which providers have credentials and which one is used.
    Status {
        /// Also print the effective config as JSON.
        #[arg(long)]
        show_config: bool,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
