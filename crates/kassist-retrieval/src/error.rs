//! Error types for kassist-retrieval.

use thiserror::Error;

/// Result type for kassist-retrieval operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when configuring the retrieval core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Chunk size must be at least one character.
    #[error("Chunk size must be greater than zero")]
    ZeroChunkSize,

    /// Overlap must leave room for forward progress.
    #[error("Chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapTooLarge {
        /// Configured chunk size.
        size: usize,
        /// Configured overlap.
        overlap: usize,
    },
}
