//! Model backend implementations for hospinav.
//!
//! All providers implement the `hospinav_core::Provider` trait.
//! [`build_from_config`] creates the configured backend.

pub mod gemini;

pub use gemini::GeminiProvider;

use hospinav_config::AppConfig;
use hospinav_core::error::ProviderError;
use hospinav_core::provider::Provider;
use std::sync::Arc;

/// Build the provider described by `config`.
///
/// Fails with [`ProviderError::NotConfigured`] when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ProviderError::NotConfigured("no API key configured".into()))?;

    let provider = GeminiProvider::new(
        api_key,
        &config.provider.routing_model,
        &config.provider.generation_model,
    )?
    .with_base_url(&config.provider.base_url)
    .with_max_output_tokens(config.provider.max_output_tokens);

    tracing::debug!(
        provider = "gemini",
        routing_model = %config.provider.routing_model,
        generation_model = %config.provider.generation_model,
        "Provider built from config"
    );

    Ok(Arc::new(provider))
}
