//! Provider factory: builds the configured backend.

use std::sync::Arc;
use std::time::Duration;
use wrenchwise_config::{AppConfig, ProviderKind};
use wrenchwise_core::error::ProviderError;
use wrenchwise_core::provider::Provider;

use crate::gemini::GeminiProvider;
use crate::scripted::ScriptedProvider;

/// Build the provider named by `config.provider.kind`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let settings = &config.provider;
    let provider: Arc<dyn Provider> = match settings.kind {
        ProviderKind::Gemini => {
            let api_key = config
                .api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    ProviderError::NotConfigured(
                        "no API key; set api_key in config.toml or GEMINI_API_KEY".into(),
                    )
                })?;
            Arc::new(GeminiProvider::new(
                api_key,
                &settings.base_url,
                Duration::from_secs(settings.request_timeout_secs),
            )?)
        }
        ProviderKind::Scripted => Arc::new(ScriptedProvider::demo()),
    };

    tracing::debug!(provider = provider.name(), "Built provider");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_requires_api_key() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn gemini_with_key() {
        let config = AppConfig {
            api_key: Some("test-key".into()),
            ..AppConfig::default()
        };
        assert_eq!(build_from_config(&config).unwrap().name(), "gemini");
    }

    #[test]
    fn scripted_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider.kind = ProviderKind::Scripted;
        assert_eq!(build_from_config(&config).unwrap().name(), "scripted");
    }
}
