//! `relaydesk serve`: Start the chat gateway.

use relaydesk_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() && config.default_provider == "openai" {
        eprintln!("  Warning: no API key configured, model requests will fail.");
        eprintln!("  Set RELAYDESK_API_KEY or OPENAI_API_KEY, or run `relaydesk onboard`.");
    }

    println!("RelayDesk Gateway");
    println!("   Listening:  http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:   {} ({})", config.default_provider, config.default_model);
    println!("   Knowledge:  {}", config.knowledge.base);
    println!("   Retrieval:  {}", if config.retrieval.enabled { "enabled" } else { "off" });

    relaydesk_gateway::start(config).await?;

    Ok(())
}
