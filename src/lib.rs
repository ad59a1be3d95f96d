//! # Knowledge Assistant server
//!
//! Upload documents, search them semantically and ask questions about them.
//! Uploaded files go through text extraction (PDF, DOCX, image OCR, plain
//! text), are split into overlapping chunks and embedded through a remote
//! embedding API. Chat requests rank the stored chunk embeddings against the
//! question and hand the best matches to an LLM as context.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `kassist-server` binary
//! 2. **As a library** - Build an [`AppState`] yourself and mount
//!    [`api::routes::build_app`] or reuse individual services
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use kassist::{Provider, LLMClient};
//! use kassist::llm::GenerationParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::Ollama {
//!         base_url: "http://localhost:11434".to_string(),
//!         model: "llama3.2:3b".to_string(),
//!         params: GenerationParams::default(),
//!     };
//!
//!     let client = provider.create_client().await?;
//!     let response = client.generate("Hello, world!").await?;
//!     println!("{}", response);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use kassist::{AppState, KassistConfigManager, TursoClient, ConfigBasedLLMFactory};
//! use kassist::extract::TesseractOcr;
//! use kassist::rag::{CachedEmbedder, HttpEmbedder};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(KassistConfigManager::new("kassist.toml")?);
//! let config = config_manager.config();
//!
//! let turso = Arc::new(TursoClient::from_config(&config).await?);
//! let embedder = Arc::new(HttpEmbedder::from_config(
//!     &config.embedding,
//!     config.embedding_api_key()?,
//! )?);
//! let embedder = Arc::new(CachedEmbedder::new(embedder, config.embedding.cache_size));
//! let llm = Arc::new(ConfigBasedLLMFactory::new(config_manager.clone()));
//! let ocr = Arc::new(TesseractOcr::from_config(&config.ocr));
//!
//! let state = AppState::new(config_manager, turso, embedder, llm, ocr);
//! let app = kassist::api::routes::build_app(state);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama chat provider via `ollama-rs` (default) |
//! | `swagger-ui` | Interactive API docs at `/docs` |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`chat`] - Retrieval-augmented chat and history
//! - [`cli`] - Command-line interface
//! - [`db`] - libsql storage (local file, in-memory, or Turso)
//! - [`documents`] - Upload pipeline, search and deletion
//! - [`extract`] - Text extraction from uploaded files
//! - [`llm`] - LLM client implementations
//! - [`rag`] - Embedding providers and cache
//! - [`types`] - Common types and error handling
//!
//! Chunking, cosine ranking and confidence scoring live in the
//! `kassist-retrieval` workspace crate.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Chat modes, prompt assembly and conversation history.
pub mod chat;
/// Command-line interface.
pub mod cli;
/// Database client (libsql / Turso).
pub mod db;
/// Document upload pipeline and semantic search.
pub mod documents;
/// Text extraction (PDF, DOCX, OCR, plain text).
pub mod extract;
/// LLM provider clients and abstractions.
pub mod llm;
/// Embedding providers and caching.
pub mod rag;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use chat::{ChatMode, ChatService};
pub use db::TursoClient;
pub use documents::DocumentService;
pub use llm::{
    ConfigBasedLLMFactory, LLMClient, LLMClientFactory, LLMClientFactoryTrait, Provider,
};
pub use rag::Embedder;
pub use types::{AppError, Result};
pub use utils::toml_config::{KassistConfig, KassistConfigManager};

use crate::extract::OcrEngine;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML-based configuration with hot-reload support
    pub config_manager: Arc<KassistConfigManager>,
    /// Database client
    pub turso: Arc<TursoClient>,
    /// Upload, search and delete pipeline
    pub documents: Arc<DocumentService>,
    /// Retrieval-augmented chat
    pub chat: Arc<ChatService>,
    /// LLM client factory
    pub llm_factory: Arc<dyn LLMClientFactoryTrait>,
    /// Embedding provider (usually cached)
    pub embedder: Arc<dyn Embedder>,
}

impl AppState {
    /// Wire the services together around shared storage and providers.
    pub fn new(
        config_manager: Arc<KassistConfigManager>,
        turso: Arc<TursoClient>,
        embedder: Arc<dyn Embedder>,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let documents = Arc::new(DocumentService::new(
            turso.clone(),
            embedder.clone(),
            ocr,
            config_manager.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            turso.clone(),
            documents.clone(),
            llm_factory.clone(),
        ));

        Self {
            config_manager,
            turso,
            documents,
            chat,
            llm_factory,
            embedder,
        }
    }
}
