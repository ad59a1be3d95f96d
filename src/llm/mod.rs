//! LLM Provider Clients and Abstractions
//!
//! Answers are generated through the [`LLMClient`] trait, which hides the
//! provider-specific wire formats from the chat service.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`LLMClientFactoryTrait`] - Creates clients; mocked in tests
//! - [`ConfigBasedLLMFactory`] - Creates clients from the live `[llm]` section of `kassist.toml`
//!
//! # Supported Providers
//!
//! - `gemini` - Google Gemini (`generateContent`)
//! - `openai` - OpenAI API and compatible endpoints
//! - `ollama` - Local Ollama server (Cargo feature `ollama`, on by default)
//!
//! # Example
//!
//! ```ignore
//! use kassist::llm::{ConfigBasedLLMFactory, LLMClientFactoryTrait};
//!
//! let factory = ConfigBasedLLMFactory::new(config_manager);
//! let client = factory.create_default().await?;
//! let answer = client.generate_with_system("Be concise.", "What is 2+2?").await?;
//! ```

/// Core LLM client trait, provider enum and factories.
pub mod client;
pub mod gemini;
pub mod openai;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{
    ConfigBasedLLMFactory, GenerationParams, LLMClient, LLMClientFactory, LLMClientFactoryTrait,
    Provider,
};
