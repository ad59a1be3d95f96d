//! Mock implementations for testing.
//!
//! Stand-ins for the LLM, embedding and OCR providers so tests never leave
//! the process.

use async_trait::async_trait;
use kassist::extract::{OcrEngine, OcrOutput};
use kassist::llm::{GenerationParams, LLMClient, LLMClientFactoryTrait, Provider};
use kassist::rag::Embedder;
use kassist::types::{AppError, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Prompt pair seen by [`MockLLMClient`]: (system, prompt).
pub type RecordedPrompt = (String, String);

/// Mock LLM client with a canned response that records every prompt.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<RecordedPrompt>>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Prompts received so far, shared across clones.
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .push((system.to_string(), prompt.to_string()));
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Factory handing out clones of one [`MockLLMClient`].
pub struct MockLLMFactory {
    client: MockLLMClient,
}

impl MockLLMFactory {
    pub fn new(client: MockLLMClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    fn default_provider(&self) -> Result<Provider> {
        Ok(Provider::Ollama {
            base_url: "http://localhost:11434".to_string(),
            model: "mock-model".to_string(),
            params: GenerationParams::default(),
        })
    }

    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(self.client.clone()))
    }

    async fn create_with_provider(&self, _provider: Provider) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(self.client.clone()))
    }
}

/// Dimensions of [`MockEmbedder`] vectors.
pub const MOCK_DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lower-cased word bumps one hashed bucket, so
/// texts sharing vocabulary have a high cosine similarity.
pub struct MockEmbedder {
    fail_on: Option<String>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self { fail_on: None }
    }

    /// Fail for any text containing `needle`.
    pub fn failing_on(needle: &str) -> Self {
        Self {
            fail_on: Some(needle.to_string()),
        }
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; MOCK_DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % MOCK_DIMENSIONS] += 1.0;
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::Embedding("Cannot embed empty text".to_string()));
        }
        if let Some(needle) = &self.fail_on {
            if text.contains(needle.as_str()) {
                return Err(AppError::Embedding("Mock embedding failure".to_string()));
            }
        }
        Ok(Self::vector_for(text))
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

/// OCR engine returning fixed text and word confidences.
pub struct StubOcr {
    text: String,
    confidences: Vec<f32>,
}

impl StubOcr {
    pub fn new(text: &str, confidences: Vec<f32>) -> Self {
        Self {
            text: text.to_string(),
            confidences,
        }
    }
}

impl OcrEngine for StubOcr {
    fn recognize(&self, _image: &[u8]) -> Result<OcrOutput> {
        Ok(OcrOutput {
            text: self.text.clone(),
            word_confidences: self.confidences.clone(),
        })
    }
}
