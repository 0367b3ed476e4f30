//! In-process embedding cache
//!
//! Uses moka async cache (Send + Sync, TTL-based eviction). Embeddings are
//! deterministic, so a cached vector is always the vector the provider would
//! return. Errors are never cached.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::embedding::{validate_text, Embedder};
use crate::config::EmbeddingCacheConfig;
use crate::error::Result;

/// Embedder decorator that memoizes vectors by exact text
#[derive(Clone)]
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    id: String,
    embeddings: Cache<String, Vec<f32>>,
}

impl CachedEmbedder {
    /// Wrap `inner` with a cache sized by `config`
    pub fn new(inner: Arc<dyn Embedder>, config: &EmbeddingCacheConfig) -> Self {
        CachedEmbedder {
            id: format!("{}+cache", inner.id()),
            inner,
            embeddings: Cache::builder()
                .max_capacity(config.capacity)
                .time_to_live(config.ttl)
                .build(),
        }
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;

        if let Some(cached) = self.embeddings.get(text).await {
            debug!("Embedding cache hit");
            return Ok(cached);
        }

        let embedding = self.inner.embed(text).await?;
        self.embeddings
            .insert(text.to_string(), embedding.clone())
            .await;
        Ok(embedding)
    }
}
