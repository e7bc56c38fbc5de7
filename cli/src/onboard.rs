use crate::templates::DEFAULT_PERSONA;
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use orbit_core::agent::context::PERSONA_FILE;
use orbit_core::config::Config;
use std::path::Path;

const BANNER: &str = r"
    -------------------------------------

      ___  ____  ____ ___ _____
     / _ \|  _ \| __ )_ _|_   _|
    | | | | |_) |  _ \| |  | |
    | |_| |  _ <| |_) | |  | |
     \___/|_| \_\____/___| |_|

    -------------------------------------
";

const PROVIDERS: &[(&str, &str)] = &[("gemini", "Google Gemini"), ("openai", "OpenAI")];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

/// Writes `PERSONA.md` unless the user already has one.
pub fn ensure_persona_file(workspace: &Path) -> Result<bool> {
    std::fs::create_dir_all(workspace)?;

    let path = workspace.join(PERSONA_FILE);
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(&path, DEFAULT_PERSONA)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

fn setup_provider() -> Result<String> {
    let labels: Vec<&str> = PROVIDERS.iter().map(|(_, label)| *label).collect();

    let selection = Select::new()
        .with_prompt("Select your model provider")
        .items(&labels)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(PROVIDERS[selection].0.to_string())
}

fn setup_api_key(provider: &str) -> Result<String> {
    let env_hint = match provider {
        "gemini" => "GEMINI_API_KEY",
        _ => "OPENAI_API_KEY",
    };

    let api_key: String = Input::new()
        .with_prompt(format!("Enter your API key (leave empty to use ${})", env_hint))
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    Ok(api_key.trim().to_string())
}

fn setup_model(provider: &str) -> Result<String> {
    let models: &[&str] = match provider {
        "gemini" => &["gemini-2.5-flash", "gemini-2.5-pro", "gemini-2.5-flash-lite"],
        _ => &["gpt-4o", "gpt-4o-mini", "gpt-5", "gpt-5-mini"],
    };

    let selection = Select::new()
        .with_prompt("Select your model")
        .items(models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    Ok(models[selection].to_string())
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to Orbit!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your agent in under 30 seconds.").dim()
    );
    println!();

    print_step(1, 4, "Provider");
    let provider = setup_provider()?;

    print_step(2, 4, "API Key Setup");
    let api_key = setup_api_key(&provider)?;

    print_step(3, 4, "Model Selection");
    let model = setup_model(&provider)?;

    let config = Config {
        provider,
        api_key,
        model,
        ..Default::default()
    };

    print_step(4, 4, "Workspace Setup");
    match ensure_persona_file(&config.workspace_dir) {
        Ok(created) => {
            let verb = if created { "created" } else { "kept" };
            println!(
                "  {} {} {} at {}",
                style("✓").green(),
                PERSONA_FILE,
                verb,
                style(config.workspace_dir.display()).cyan()
            );
        }
        Err(e) => eprintln!(
            "  {} Warning: Could not create {}: {}",
            style("!").yellow(),
            PERSONA_FILE,
            e
        ),
    }

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(orbit_core::config::get_config_path().display()).cyan()
    );
    println!(
        "  {} Sessions are stored in {}",
        style("→").green(),
        style(config.transcript.sessions_dir().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("orbit chat").cyan().bold()
    );
    println!();

    Ok(config)
}
