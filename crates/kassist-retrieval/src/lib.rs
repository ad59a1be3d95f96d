//! # kassist-retrieval
//!
//! The retrieval core of the Knowledge Assistant server, kept free of I/O so
//! it can be tested in isolation.
//!
//! ## Pipeline
//!
//! ```text
//!   document text ──► TextChunker ──► chunks ──► (embedding API) ──► stored vectors
//!                                                                       │
//!   query ──► (embedding API) ──► query vector ──► rank (linear scan) ◄─┘
//!                                                     │
//!                                                     ▼
//!                                           top-k similarities
//!                                                     │
//!                                                     ▼
//!                                           confidence_score
//! ```
//!
//! There is no index structure: every stored vector is compared against the
//! query with [`cosine_similarity`]. That is the intended trade-off for
//! collections of a few thousand chunks.
//!
//! ## Quick Start
//!
//! ```rust
//! use kassist_retrieval::{confidence_score, rank, TextChunker};
//!
//! let chunker = TextChunker::new(1000, 200).unwrap();
//! let chunks = chunker.chunk("Rust is a systems language. It has no GC.");
//! assert_eq!(chunks.len(), 1);
//!
//! let stored = vec![("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])];
//! let hits = rank(&[1.0, 0.1], stored, 1);
//! assert_eq!(hits[0].item, "a");
//!
//! let scores: Vec<f32> = hits.iter().map(|h| h.score).collect();
//! assert!(confidence_score(&scores) > 0.1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunker;
pub mod distance;
pub mod error;
pub mod scoring;
pub mod search;

pub use chunker::{TextChunk, TextChunker};
pub use distance::cosine_similarity;
pub use error::{Error, Result};
pub use scoring::confidence_score;
pub use search::{rank, Scored};
