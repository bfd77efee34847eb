//! `pocketllm ask` — Single-message mode, no HTTP involved.

use pocketllm_core::ReplySource;
use std::path::PathBuf;

pub async fn run(
    config_path: Option<PathBuf>,
    message: String,
    history: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if message.trim().is_empty() {
        return Err("Message is required".into());
    }

    let config = super::load_config(config_path)?;
    let service = super::build_service(&config).await;

    let reply = service
        .respond(&message, &history)
        .await
        .map_err(|failure| failure.public_message())?;

    let label = match reply.source {
        ReplySource::Model => "model",
        ReplySource::Fallback => "fallback",
    };

    println!();
    println!("Q: {message}");
    println!("A ({label}): {}", reply.reply_text);
    println!();
    for suggestion in &reply.suggestions {
        println!("  • {suggestion}");
    }

    Ok(())
}
