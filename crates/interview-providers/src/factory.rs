//! Provider factory.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use interview_core::config::ProviderConfig;
use interview_core::traits::LlmProvider;

use crate::chat::ChatCompletionsProvider;

/// Build a provider from its configuration entry.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn LlmProvider>> {
    let provider = match config {
        ProviderConfig::Together { api_key, base_url } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("provider '{name}' has an empty api_key");
            }
            ChatCompletionsProvider::together(api_key, base_url.clone())?
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            if api_key.trim().is_empty() {
                anyhow::bail!("provider '{name}' has an empty api_key");
            }
            ChatCompletionsProvider::openai(api_key, base_url.clone(), org_id.clone())?
        }
        ProviderConfig::Ollama { base_url } => ChatCompletionsProvider::ollama(base_url)?,
    };

    tracing::debug!(provider = name, kind = provider.name(), "provider created");
    Ok(Arc::new(provider.with_timeout(timeout)?))
}
