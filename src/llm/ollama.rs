use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};

const DEFAULT_OLLAMA_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
}

impl OllamaClient {
    pub async fn new(base_url: String, model: String) -> Result<Self> {
        let (host, port) = split_host_port(&base_url)?;
        let client = Ollama::new(host, port);

        Ok(Self { client, model })
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `http://host:port` into the `(scheme://host, port)` pair `ollama-rs` expects.
fn split_host_port(base_url: &str) -> Result<(String, u16)> {
    let url = reqwest::Url::parse(base_url)
        .map_err(|e| AppError::LLM(format!("Invalid Ollama URL '{}': {}", base_url, e)))?;
    let host = url
        .host_str()
        .ok_or_else(|| AppError::LLM(format!("Ollama URL '{}' has no host", base_url)))?;
    let port = url.port().unwrap_or(DEFAULT_OLLAMA_PORT);

    Ok((format!("{}://{}", url.scheme(), host), port))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.chat(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.chat(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
