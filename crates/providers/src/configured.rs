//! Builds the one provider the gateway talks to.
//!
//! The `[providers.<name>]` section for `default_provider` may override the
//! endpoint, the key and the model. Well-known names have a built-in
//! endpoint; any other name needs an `api_url`.

use relaydesk_config::AppConfig;
use relaydesk_core::error::ProviderError;
use relaydesk_core::provider::Provider;
use std::sync::Arc;
use tracing::debug;

use crate::openai_compat::OpenAiCompatProvider;

/// The configured provider and the model to request from it.
pub struct ConfiguredProvider {
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

/// Resolve `default_provider` against its optional config section.
pub fn from_config(config: &AppConfig) -> Result<ConfiguredProvider, ProviderError> {
    let name = config.default_provider.as_str();
    let section = config.providers.get(name);

    let base_url = section
        .and_then(|p| p.api_url.clone())
        .or_else(|| known_endpoint(name).map(String::from))
        .ok_or_else(|| {
            ProviderError::NotConfigured(format!("{name}: set providers.{name}.api_url"))
        })?;
    let api_key = section
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();
    let model = section
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    debug!(provider = name, %base_url, %model, "Provider configured");
    Ok(ConfiguredProvider {
        provider: Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)),
        model,
    })
}

fn known_endpoint(name: &str) -> Option<&'static str> {
    match name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}
