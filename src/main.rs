mod auth;
mod config;
mod dispatcher;
mod error;
mod gateway;
mod gemini;
mod interpreter;
mod models;
mod repl;
mod server;
mod tools;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use dispatcher::{Dispatcher, Mode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "task-agent")]
#[command(about = "Natural-language front end for the project/task gateway")]
struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(long, env = "AGENT_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP front end (default)
    Serve,
    /// Interactive prompt in the terminal
    Chat,
    /// Handle a single query and exit
    Ask {
        /// The request, in plain language
        #[arg(required = true)]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    pretty_env_logger::init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    log::info!("Configuration loaded successfully");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(&config).await,
        Command::Chat => {
            let dispatcher = Dispatcher::from_config(&config)
                .context("Cannot start the interactive agent")?;
            repl::run(&dispatcher).await
        }
        Command::Ask { query } => {
            let dispatcher =
                Dispatcher::from_config(&config).context("Cannot start the agent")?;
            dispatcher
                .handle(&query.join(" "), Mode::Verbose)
                .await
                .context("Query failed")?;
            Ok(())
        }
    }
}
