//! `pocketllm serve` — Load the model, then start the HTTP API server.

use std::path::PathBuf;

pub async fn run(
    config_path: Option<PathBuf>,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(host) = host_override {
        config.gateway.host = host;
    }
    if let Some(port) = port_override {
        config.gateway.port = port;
    }
    config.validate()?;

    println!("🤖 PocketLLM backend starting");
    println!("   Models: {}", config.model.candidates().join(" → "));
    println!("   On model failure: {}", config.on_model_unavailable);

    // The listener binds only after loading has finished or given up
    let service = super::build_service(&config).await;

    match service.model().model_name() {
        Some(name) => println!("   Model loaded: {name}"),
        None => println!("   ⚠️  No model loaded, replies come from the fallback responder"),
    }
    println!("   Listening: http://{}", config.gateway.addr());

    pocketllm_gateway::start(&config.gateway, service).await?;

    Ok(())
}
