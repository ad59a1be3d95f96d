//! Embedding Cache
//!
//! [`CachedEmbedder`] sits in front of any [`Embedder`] and keeps recently
//! computed vectors in an in-memory LRU, so repeated search queries do not
//! hit the embedding API again.
//!
//! # Cache Key Strategy
//!
//! Keys are SHA-256 hashes of `text + "|" + model_name`, so switching the
//! embedding model never serves vectors from the old one.
//!
//! # Example
//!
//! ```ignore
//! use kassist::rag::{CachedEmbedder, HttpEmbedder};
//!
//! let inner = Arc::new(HttpEmbedder::from_config(&config.embedding, key)?);
//! let embedder = CachedEmbedder::new(inner, 1000);
//! let vector = embedder.embed("hello world").await?;
//! assert_eq!(embedder.stats().misses, 1);
//! ```

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::embeddings::Embedder;
use crate::types::Result;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries in cache
    pub entry_count: usize,
    /// Maximum number of entries
    pub capacity: usize,
}

/// Compute a cache key for the given text and model
pub fn compute_key(text: &str, model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b"|");
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// LRU-cached wrapper around another embedder.
///
/// Errors from the inner embedder are passed through and never cached.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedEmbedder {
    /// Wrap `inner` with room for `capacity` vectors (at least one).
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: cache.len(),
            capacity: cache.cap().get(),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let key = compute_key(text, self.inner.model_name());

        // Lock is never held across the await below.
        let cached = self.cache.lock().get(&key).cloned();
        if let Some(vector) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let vector = self.inner.embed(text).await?;
        self.cache.lock().put(key, vector.clone());
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
