use crate::llm::client::{GenerationParams, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Client for OpenAI and OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    params: GenerationParams,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        params: GenerationParams,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(params.timeout)
            .build()
            .map_err(|e| AppError::LLM(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            params,
        })
    }

    async fn complete(&self, messages: Vec<ChatMessage<'_>>) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "OpenAI API returned {}: {}",
                status, detail
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid OpenAI response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::LLM("No response from OpenAI".to_string()))
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(vec![ChatMessage {
            role: "user",
            content: prompt,
        }])
        .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.complete(vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: prompt,
            },
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
