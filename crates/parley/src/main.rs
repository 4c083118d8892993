// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - a terminal chat client that streams OpenAI completions.
//!
//! This is the binary entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod chat;

/// Parley - a terminal chat client that streams OpenAI completions.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// OpenAI API key; overrides config file and environment.
    #[arg(long, global = true, value_name = "KEY")]
    api_key: Option<String>,

    /// Model for this run (gpt-4-turbo, gpt-4, or gpt-3.5-turbo).
    #[arg(long, global = true, value_name = "MODEL")]
    model: Option<String>,

    /// Sampling temperature for this run, 0.0 to 2.0.
    #[arg(long, global = true, value_name = "T")]
    temperature: Option<f32>,

    /// Maximum response tokens for this run, 100 to 4000.
    #[arg(long, global = true, value_name = "N")]
    max_tokens: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive chat session (the default).
    Chat,
    /// Print the resolved configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match &cli.config {
        Some(path) => parley_config::load_and_validate_path(path),
        None => parley_config::load_and_validate(),
    };
    let config = match config {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.chat.log_level);

    match cli.command {
        None | Some(Commands::Chat) => {
            let options = chat::ChatOptions {
                api_key: cli.api_key,
                model: cli.model,
                temperature: cli.temperature,
                max_tokens: cli.max_tokens,
            };
            if let Err(e) = chat::run_chat(config, options).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config(&config);
        }
    }
}

/// Prints the effective configuration as TOML, with the API key redacted.
fn print_config(config: &parley_config::ParleyConfig) {
    let mut redacted = config.clone();
    if redacted.openai.api_key.is_some() {
        redacted.openai.api_key = Some("<redacted>".to_string());
    }
    match toml::to_string_pretty(&redacted) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => eprintln!("error: failed to render config: {e}"),
    }
}

/// Initializes the tracing subscriber honoring `RUST_LOG` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
