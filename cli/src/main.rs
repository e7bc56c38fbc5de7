use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use orbit_core::session::DEFAULT_SESSION;
use orbit_core::{ChatError, agent, config, providers, session, store, tools};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod history;
mod onboard;
mod templates;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "orbit - a tool-calling agent with persistent sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure provider, API key and model
    Onboard,
    /// Send one message, or start an interactive session
    Chat {
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Print the stored transcript of a session
    History {
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
    },
    /// Delete the stored transcript of a session
    Reset {
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_agent(config: &config::Config) -> Result<agent::AgentLoop> {
    let provider = providers::create_provider(config)?;

    let mut context_builder =
        agent::ContextBuilder::new(&config.workspace_dir).with_runtime_context(true);
    if let Some(instruction) = &config.system_instruction {
        context_builder = context_builder.with_instruction(instruction.clone());
    }

    let mut tool_registry = agent::ToolRegistry::new();
    tool_registry.register(Arc::new(tools::WeatherTool::new()))?;
    tool_registry.register(Arc::new(tools::MultiplyTool))?;
    tool_registry.register(Arc::new(tools::BmiTool))?;
    tool_registry.register(Arc::new(tools::SearchTool::new(provider.clone())))?;

    let transcript_store = store::create_transcript_store(&config.transcript);
    tracing::debug!(
        provider = provider.name(),
        model = %config.model,
        store = transcript_store.name(),
        "Agent ready"
    );
    let sessions = Arc::new(session::SessionRepository::new(transcript_store));

    Ok(
        agent::AgentLoop::new(provider, context_builder, Arc::new(tool_registry))
            .with_sessions(sessions)
            .with_max_rounds(config.max_rounds)
            .with_parallel_tool_calls(config.parallel_tool_calls),
    )
}

fn report_chat_error(e: &ChatError) {
    match e {
        ChatError::Transport(e) => {
            eprintln!("{} Model service error: {}", style("✗").red().bold(), e);
            eprintln!("  {}", style("Your message is kept in the session. Try again.").dim());
        }
        ChatError::ToolLoopExceeded { rounds } => {
            eprintln!(
                "{} The model was still calling tools after {} rounds, giving up on this message.",
                style("✗").red().bold(),
                rounds
            );
            eprintln!("  {}", style("Raise max_rounds in config.toml if this is expected.").dim());
        }
        other => eprintln!("{} {}", style("✗").red().bold(), other),
    }
}

fn print_answer(answer: &str) {
    println!();
    termimad::print_text(answer);
    println!();
}

async fn run_repl(agent_loop: &agent::AgentLoop, session_id: &str) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let history_path = config::get_orbit_dir().join("history.txt");
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
    }

    println!("{} Orbit", style("🛰").cyan());
    println!(
        "{}",
        style(format!("Session '{}'. Type 'exit' or press Ctrl+D to leave.", session_id)).dim()
    );
    println!();

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(input);

                if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                    break;
                }

                match agent_loop.chat(session_id, input).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => report_chat_error(&e),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{} {}", style("✗").red().bold(), e);
                break;
            }
        }
    }

    println!("\n👋 Goodbye!");
    config::ensure_orbit_dir()?;
    let _ = editor.save_history(&history_path);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat {
                message: None,
                session: DEFAULT_SESSION.to_string(),
            }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard().map_err(|e| {
                eprintln!("❌ Onboarding failed: {}", e);
                anyhow::anyhow!("Onboarding failed: {}", e)
            })?;
            config::save_config(&onboard_config)?;
        }
        Commands::Chat { message, session } => {
            let config = config::load_config()?;

            if let Err(e) = onboard::ensure_persona_file(&config.workspace_dir) {
                eprintln!(
                    "❌ Error: Could not prepare workspace at {}: {}",
                    config.workspace_dir.display(),
                    e
                );
                return Err(e);
            }

            let agent_loop = build_agent(&config)?;

            if let Some(msg) = message {
                match agent_loop.chat(&session, &msg).await {
                    Ok(answer) => print_answer(&answer),
                    Err(e) => {
                        report_chat_error(&e);
                        return Err(e.into());
                    }
                }
            } else {
                run_repl(&agent_loop, &session).await?;
            }
        }
        Commands::History { session } => {
            let config = config::Config::load_or_init()?;
            history::show_history(&config, &session).await?;
        }
        Commands::Reset { session } => {
            let config = config::Config::load_or_init()?;
            history::reset_session(&config, &session).await?;
        }
    }

    Ok(())
}
