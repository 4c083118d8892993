// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The interactive chat REPL.
//!
//! Reads user input with readline history, streams the assistant reply to
//! stdout fragment by fragment, and exposes the generation controls as
//! slash commands. One request is in flight at a time: the loop awaits
//! each turn to completion before reading the next prompt.

use std::io::Write;
use std::str::FromStr;

use colored::Colorize;
use parley_config::ParleyConfig;
use parley_core::{ChatModel, GenerationParams, ParleyError};
use parley_openai::OpenAiProvider;
use parley_session::{resolve_system_prompt, ChatSession};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

/// Per-run overrides collected from the command line.
#[derive(Debug, Default)]
pub struct ChatOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// What the REPL should do after a slash command.
#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    Continue,
    Quit,
}

/// Runs the interactive chat session.
///
/// The missing-credential check happens before the provider is built, so
/// no request is ever attempted without a key; the session store stays
/// untouched and setup instructions are printed instead.
pub async fn run_chat(config: ParleyConfig, options: ChatOptions) -> Result<(), ParleyError> {
    let provider = match OpenAiProvider::from_config(&config, options.api_key.as_deref()) {
        Ok(provider) => provider,
        Err(ParleyError::MissingCredential) => {
            print_setup_instructions();
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let mut params = initial_params(&config, &options)?;

    let system_prompt =
        resolve_system_prompt(&config.chat.system_prompt, &config.chat.system_prompt_file);
    let mut session = ChatSession::new(system_prompt);

    let mut rl = DefaultEditor::new()
        .map_err(|e| ParleyError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "parley".bold().green());
    println!(
        "Chatting with {}. Type {} for commands, {} to exit.\n",
        params.model.to_string().cyan(),
        "/help".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", "parley".green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed.starts_with('/') {
                    match handle_command(trimmed, &mut session, &mut params) {
                        CommandOutcome::Continue => continue,
                        CommandOutcome::Quit => break,
                    }
                }

                // One streaming turn; fragments are rendered as they arrive.
                let result = session
                    .run_turn(&provider, trimmed, &params, |fragment| {
                        print!("{fragment}");
                        std::io::stdout().flush().ok();
                    })
                    .await;

                println!();
                if let Err(e) = result {
                    render_turn_error(&e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    debug!(turns = session.conversation().len(), "chat session ended");
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Builds the starting generation parameters from config plus CLI overrides.
///
/// The config has already passed validation; overrides are checked here so
/// an out-of-range flag is rejected before the first request.
fn initial_params(
    config: &ParleyConfig,
    options: &ChatOptions,
) -> Result<GenerationParams, ParleyError> {
    let model = match &options.model {
        Some(name) => parse_model(name)?,
        None => ChatModel::from_str(&config.openai.default_model)
            .map_err(|_| unsupported_model_error(&config.openai.default_model))?,
    };

    let params = GenerationParams {
        model,
        temperature: options.temperature.unwrap_or(config.openai.temperature),
        max_output_tokens: options.max_tokens.unwrap_or(config.openai.max_tokens),
    };
    params.validate()?;
    Ok(params)
}

/// Parses a model identifier, listing the supported ones on failure.
fn parse_model(name: &str) -> Result<ChatModel, ParleyError> {
    ChatModel::from_str(name).map_err(|_| unsupported_model_error(name))
}

fn unsupported_model_error(name: &str) -> ParleyError {
    let supported = ChatModel::ALL
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    ParleyError::Config(format!(
        "model `{name}` is not supported (supported models: {supported})"
    ))
}

/// Handles one slash command against the session and current parameters.
fn handle_command(
    line: &str,
    session: &mut ChatSession,
    params: &mut GenerationParams,
) -> CommandOutcome {
    let mut parts = line.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();

    match command {
        "/quit" | "/exit" => return CommandOutcome::Quit,
        "/clear" => {
            session.clear();
            println!("{}", "Chat history cleared!".green());
        }
        "/model" => match parse_model(argument) {
            Ok(model) => {
                params.model = model;
                println!("model set to {}", model.to_string().cyan());
            }
            Err(e) => eprintln!("{}: {e}", "error".red()),
        },
        "/temperature" | "/temp" => match argument.parse::<f32>() {
            Ok(value) => {
                let candidate = GenerationParams {
                    temperature: value,
                    ..*params
                };
                match candidate.validate() {
                    Ok(()) => {
                        params.temperature = value;
                        println!("temperature set to {value}");
                    }
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(_) => eprintln!(
                "{}: `{argument}` is not a number",
                "error".red()
            ),
        },
        "/max-tokens" => match argument.parse::<u32>() {
            Ok(value) => {
                let candidate = GenerationParams {
                    max_output_tokens: value,
                    ..*params
                };
                match candidate.validate() {
                    Ok(()) => {
                        params.max_output_tokens = value;
                        println!("max tokens set to {value}");
                    }
                    Err(e) => eprintln!("{}: {e}", "error".red()),
                }
            }
            Err(_) => eprintln!(
                "{}: `{argument}` is not a whole number",
                "error".red()
            ),
        },
        "/params" => {
            println!(
                "model={} temperature={} max_tokens={} turns={}",
                params.model, params.temperature, params.max_output_tokens,
                session.conversation().len()
            );
        }
        "/help" => print_help(),
        unknown => {
            eprintln!("{}: unknown command `{unknown}`, try /help", "error".red());
        }
    }
    CommandOutcome::Continue
}

fn print_help() {
    println!("  /model <id>        switch model (gpt-4-turbo, gpt-4, gpt-3.5-turbo)");
    println!("  /temperature <t>   set sampling temperature (0.0 to 2.0)");
    println!("  /max-tokens <n>    set maximum response tokens (100 to 4000)");
    println!("  /params            show current parameters");
    println!("  /clear             clear chat history");
    println!("  /quit              exit");
}

/// Renders a failed turn inline. Quota and transport problems are
/// warnings worth re-trying by hand; everything else is an error.
fn render_turn_error(err: &ParleyError) {
    match err {
        ParleyError::RateLimited { .. } => {
            eprintln!(
                "{}: {err}. Please wait a moment and try again.",
                "warning".yellow()
            );
        }
        ParleyError::Connection { .. } => {
            eprintln!(
                "{}: {err}. Please check your internet connection and try again.",
                "warning".yellow()
            );
        }
        _ => {
            eprintln!("{}: {err}", "error".red());
        }
    }
}

/// Printed when no API key could be resolved from any source.
fn print_setup_instructions() {
    eprintln!("{}: OpenAI API key required", "warning".yellow());
    eprintln!();
    eprintln!("Provide a key one of these ways:");
    eprintln!("  1. pass it directly:        parley --api-key sk-...");
    eprintln!("  2. add it to parley.toml:");
    eprintln!();
    eprintln!("     [openai]");
    eprintln!("     api_key = \"sk-...\"");
    eprintln!();
    eprintln!("  3. export OPENAI_API_KEY in your environment");
    eprintln!();
    eprintln!("Keys are issued at https://platform.openai.com/api-keys");
}
