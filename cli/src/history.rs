use anyhow::Result;
use console::style;
use orbit_core::config::Config;
use orbit_core::conversation::{Role, Turn};
use orbit_core::store::create_transcript_store;
use orbit_core::traits::TranscriptStore;

fn print_turn(turn: &Turn) {
    match turn.role {
        Role::User => {
            if let Some(text) = turn.text() {
                println!("{} {}", style("you   ›").cyan().bold(), text);
            }
        }
        Role::Model => {
            if let Some(text) = turn.text() {
                println!("{} {}", style("orbit ›").green().bold(), text);
            }
            for call in &turn.tool_calls {
                println!(
                    "{}",
                    style(format!("        → {}({}) [{}]", call.name, call.arguments, call.id)).dim()
                );
            }
        }
        Role::Tool => {
            let result = turn
                .result
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default();
            println!(
                "{}",
                style(format!(
                    "        ← {}: {}",
                    turn.tool_name.as_deref().unwrap_or("?"),
                    result
                ))
                .dim()
            );
        }
    }
}

pub async fn show_history(config: &Config, session_id: &str) -> Result<()> {
    let store = create_transcript_store(&config.transcript);

    let Some(conversation) = store.load(session_id).await? else {
        println!("No transcript for session '{}'.", session_id);
        return Ok(());
    };

    println!(
        "{}",
        style(format!("Session '{}' ({} turns)", session_id, conversation.len())).bold()
    );
    println!();
    for turn in conversation.snapshot() {
        print_turn(turn);
    }
    Ok(())
}

pub async fn reset_session(config: &Config, session_id: &str) -> Result<()> {
    let store = create_transcript_store(&config.transcript);

    if store.remove(session_id).await? {
        println!("{} Session '{}' cleared", style("✓").green(), session_id);
    } else {
        println!("Nothing stored for session '{}'.", session_id);
    }
    Ok(())
}
