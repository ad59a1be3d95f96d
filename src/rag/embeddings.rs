//! Text embedding providers.
//!
//! [`HttpEmbedder`] speaks the embedding APIs of Gemini (`embedContent`),
//! OpenAI-compatible servers (`/embeddings`) and Ollama (`/api/embed`).

use crate::llm::gemini::model_path;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingConfig, ProviderKind};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Model identifier, part of the cache key.
    fn model_name(&self) -> &str;
}

/// Embed `texts` with at most `concurrency` requests in flight.
///
/// Results keep the input order; a failed text yields `None` and is logged.
pub async fn embed_all(
    embedder: &Arc<dyn Embedder>,
    texts: &[String],
    concurrency: usize,
) -> Vec<Option<Vec<f32>>> {
    stream::iter(texts.iter().cloned().enumerate())
        .map(|(index, text)| {
            let embedder = Arc::clone(embedder);
            async move {
                match embedder.embed(&text).await {
                    Ok(vector) => Some(vector),
                    Err(e) => {
                        tracing::warn!(chunk_index = index, error = %e, "Embedding failed");
                        None
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// HTTP embedding client for the configured provider.
pub struct HttpEmbedder {
    http: reqwest::Client,
    provider: ProviderKind,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GeminiEmbedResponse {
    embedding: GeminiValues,
}

#[derive(Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl HttpEmbedder {
    pub fn new(
        provider: ProviderKind,
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if provider != ProviderKind::Ollama && api_key.is_none() {
            return Err(AppError::Embedding(format!(
                "No API key configured for embedding provider '{}'",
                provider
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Build from the `[embedding]` section with an already resolved key.
    pub fn from_config(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Self> {
        Self::new(
            config.provider,
            config.base_url(),
            config.model.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn post(&self, url: String, body: serde_json::Value) -> Result<reqwest::Response> {
        let mut request = self.http.post(&url).json(&body);
        request = match (self.provider, &self.api_key) {
            (ProviderKind::Gemini, Some(key)) => request.header("x-goog-api-key", key),
            (_, Some(key)) => request.bearer_auth(key),
            (_, None) => request,
        };

        let response = request.send().await.map_err(|e| {
            AppError::Embedding(format!("{} embedding request failed: {}", self.provider, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Embedding(format!(
                "{} embedding API returned {}: {}",
                self.provider, status, detail
            )));
        }
        Ok(response)
    }

    async fn parse<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        response.json().await.map_err(|e| {
            AppError::Embedding(format!("Invalid {} embedding response: {}", self.provider, e))
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }

        let vector = match self.provider {
            ProviderKind::Gemini => {
                let model = model_path(&self.model);
                let url = format!("{}/{}:embedContent", self.base_url, model);
                let body = json!({ "model": model, "content": { "parts": [{ "text": text }] } });
                let parsed: GeminiEmbedResponse = self.parse(self.post(url, body).await?).await?;
                parsed.embedding.values
            }
            ProviderKind::OpenAI => {
                let url = format!("{}/embeddings", self.base_url);
                let body = json!({ "model": self.model, "input": text });
                let parsed: OpenAIEmbedResponse = self.parse(self.post(url, body).await?).await?;
                parsed
                    .data
                    .into_iter()
                    .next()
                    .map(|d| d.embedding)
                    .unwrap_or_default()
            }
            ProviderKind::Ollama => {
                let url = format!("{}/api/embed", self.base_url);
                let body = json!({ "model": self.model, "input": text });
                let parsed: OllamaEmbedResponse = self.parse(self.post(url, body).await?).await?;
                parsed.embeddings.into_iter().next().unwrap_or_default()
            }
        };

        if vector.is_empty() {
            return Err(AppError::Embedding(format!(
                "{} returned an empty embedding",
                self.provider
            )));
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct LengthEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "bad" {
                return Err(AppError::Embedding("boom".into()));
            }
            Ok(vec![text.len() as f32])
        }

        fn model_name(&self) -> &str {
            "length"
        }
    }

    #[tokio::test]
    async fn test_embed_all_preserves_order_and_marks_failures() {
        let embedder: Arc<dyn Embedder> = Arc::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
        });
        let texts = vec!["a".to_string(), "bad".to_string(), "abc".to_string()];

        let vectors = embed_all(&embedder, &texts, 2).await;
        assert_eq!(vectors, vec![Some(vec![1.0]), None, Some(vec![3.0])]);
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_without_request() {
        let embedder = HttpEmbedder::new(
            ProviderKind::Ollama,
            "http://127.0.0.1:9".into(),
            "nomic-embed-text".into(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let err = embedder.embed("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }

    #[test]
    fn test_remote_provider_requires_key() {
        let result = HttpEmbedder::new(
            ProviderKind::OpenAI,
            "https://api.openai.com/v1".into(),
            "text-embedding-3-small".into(),
            None,
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
