//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the text generation backends
//! used to answer chat questions:
//! - **Gemini**: Google Generative Language REST API
//! - **OpenAI**: OpenAI and OpenAI-compatible `/chat/completions` endpoints
//! - **Ollama**: Local inference via `ollama-rs` (feature `ollama`)

use crate::types::{AppError, Result};
use crate::utils::toml_config::{KassistConfigManager, LlmConfig, ProviderKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling and transport settings shared by the HTTP providers.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini (`generateContent`)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: std::env::var("GEMINI_API_KEY")?,
    ///     base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-pro".to_string(),
    ///     params: GenerationParams::default(),
    /// };
    /// ```
    Gemini {
        api_key: String,
        base_url: String,
        model: String,
        params: GenerationParams,
    },

    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: GenerationParams,
    },

    /// Local Ollama server
    Ollama {
        base_url: String,
        model: String,
        params: GenerationParams,
    },
}

impl Provider {
    /// Build the provider described by the `[llm]` section.
    pub fn from_config(config: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        let params = GenerationParams {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        };
        let require_key = |key: Option<String>| {
            key.ok_or_else(|| {
                AppError::LLM(format!("No API key configured for provider '{}'", config.provider))
            })
        };

        Ok(match config.provider {
            ProviderKind::Gemini => Provider::Gemini {
                api_key: require_key(api_key)?,
                base_url: config.base_url(),
                model: config.model.clone(),
                params,
            },
            ProviderKind::OpenAI => Provider::OpenAI {
                api_key: require_key(api_key)?,
                api_base: config.base_url(),
                model: config.model.clone(),
                params,
            },
            ProviderKind::Ollama => Provider::Ollama {
                base_url: config.base_url(),
                model: config.model.clone(),
                params,
            },
        })
    }

    /// Create a client instance for this provider
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                api_key,
                base_url,
                model,
                params,
            } => Ok(Box::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                base_url.clone(),
                model.clone(),
                params.clone(),
            )?)),

            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                params.clone(),
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url, model, ..
            } => Ok(Box::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()).await?,
            )),

            #[cfg(not(feature = "ollama"))]
            Provider::Ollama { .. } => Err(AppError::LLM(
                "Ollama support is not compiled in; rebuild with the 'ollama' feature".to_string(),
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    /// Model requested from the provider
    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. }
            | Provider::OpenAI { model, .. }
            | Provider::Ollama { model, .. } => model,
        }
    }
}

/// Trait for creating LLM clients; lets tests swap in mocks.
#[async_trait]
pub trait LLMClientFactoryTrait: Send + Sync {
    /// Provider used by [`create_default`](Self::create_default)
    fn default_provider(&self) -> Result<Provider>;

    /// Create a client using the default provider
    async fn create_default(&self) -> Result<Box<dyn LLMClient>>;

    /// Create a client using a specific provider
    async fn create_with_provider(&self, provider: Provider) -> Result<Box<dyn LLMClient>>;
}

/// Factory with a fixed default provider
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for LLMClientFactory {
    fn default_provider(&self) -> Result<Provider> {
        Ok(self.default_provider.clone())
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider.create_client().await
    }

    async fn create_with_provider(&self, provider: Provider) -> Result<Box<dyn LLMClient>> {
        provider.create_client().await
    }
}

/// Factory that resolves the provider from the live configuration on every
/// call, so a hot-reloaded `[llm]` section applies to the next request.
pub struct ConfigBasedLLMFactory {
    config: Arc<KassistConfigManager>,
}

impl ConfigBasedLLMFactory {
    pub fn new(config: Arc<KassistConfigManager>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for ConfigBasedLLMFactory {
    fn default_provider(&self) -> Result<Provider> {
        let config = self.config.config();
        let api_key = config.llm_api_key()?;
        Provider::from_config(&config.llm, api_key)
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.default_provider()?.create_client().await
    }

    async fn create_with_provider(&self, provider: Provider) -> Result<Box<dyn LLMClient>> {
        provider.create_client().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::toml_config::KassistConfig;

    #[test]
    fn test_provider_name() {
        let gemini = Provider::Gemini {
            api_key: "k".to_string(),
            base_url: "".to_string(),
            model: "gemini-pro".to_string(),
            params: GenerationParams::default(),
        };
        assert_eq!(gemini.name(), "Gemini");
        assert_eq!(gemini.model(), "gemini-pro");

        let ollama = Provider::Ollama {
            base_url: "".to_string(),
            model: "llama3.2".to_string(),
            params: GenerationParams::default(),
        };
        assert_eq!(ollama.name(), "Ollama");
    }

    #[test]
    fn test_from_config_requires_key_for_remote_providers() {
        let config = LlmConfig::default();
        let result = Provider::from_config(&config, None);
        assert!(matches!(result, Err(AppError::LLM(_))));

        let provider = Provider::from_config(&config, Some("secret".into())).unwrap();
        match provider {
            Provider::Gemini {
                api_key, base_url, ..
            } => {
                assert_eq!(api_key, "secret");
                assert_eq!(base_url, "https://generativelanguage.googleapis.com/v1beta");
            }
            other => panic!("Expected Gemini, got {}", other.name()),
        }
    }

    #[test]
    fn test_from_config_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: ProviderKind::Ollama,
            model: "llama3.2".into(),
            temperature: 0.2,
            ..LlmConfig::default()
        };

        match Provider::from_config(&config, None).unwrap() {
            Provider::Ollama { params, model, .. } => {
                assert_eq!(model, "llama3.2");
                assert_eq!(params.temperature, 0.2);
            }
            other => panic!("Expected Ollama, got {}", other.name()),
        }
    }

    #[test]
    fn test_config_factory_follows_live_config() {
        let mut config = KassistConfig::default();
        config.llm.provider = ProviderKind::Ollama;
        config.llm.model = "first".into();

        let manager = Arc::new(KassistConfigManager::from_config(config));
        let factory = ConfigBasedLLMFactory::new(manager);

        let provider = factory.default_provider().unwrap();
        assert_eq!(provider.model(), "first");
    }
}
