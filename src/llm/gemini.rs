//! Google Gemini client over the Generative Language REST API.

use crate::llm::client::{GenerationParams, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    params: GenerationParams,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini model ids are addressed as `models/<name>`.
pub(crate) fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: String,
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
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            params,
        })
    }

    async fn generate_content(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            model_path(&self.model)
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| AppError::LLM("Gemini returned no candidates".to_string()))?;

        Ok(text)
    }
}

#[async_trait]
impl LLMClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_content(None, prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_content(Some(system), prompt).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path_normalization() {
        assert_eq!(model_path("gemini-pro"), "models/gemini-pro");
        assert_eq!(model_path("models/gemini-pro"), "models/gemini-pro");
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part { text: "be brief" }],
            }),
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 64,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be brief");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 64);
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = GeminiClient::new(
            "k".into(),
            "http://localhost:9000/v1beta/".into(),
            "gemini-pro".into(),
            GenerationParams::default(),
        )
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:9000/v1beta");
        assert_eq!(client.model_name(), "gemini-pro");
    }
}
