//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! Embedding side of the pipeline. Chunking, ranking and confidence scoring
//! are pure functions in the `kassist-retrieval` crate.
//!
//! # Module Structure
//!
//! - [`rag::embeddings`](crate::rag::embeddings) - Remote embedding providers
//! - [`rag::cache`](crate::rag::cache) - LRU cache in front of an embedder
//!
//! # RAG Pipeline
//!
//! 1. **Ingestion** - Documents are extracted, chunked and embedded
//! 2. **Storage** - Embeddings stored as JSON next to each chunk in libsql
//! 3. **Retrieval** - Query embedded, every stored chunk scored by cosine similarity
//! 4. **Generation** - LLM answers with the top chunks as context

pub mod cache;
pub mod embeddings;

pub use cache::{CacheStats, CachedEmbedder};
pub use embeddings::{embed_all, Embedder, HttpEmbedder};
