//! Process-local vector index
//!
//! Brute-force cosine search over a map guarded by an async RwLock. Nothing
//! survives a restart; use it for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::core::storage::{check_dimension, check_top_k};
use crate::core::{cosine_similarity, IndexEntry, IndexMatch, IndexStats, MemoryIndex, MetadataFilter};
use crate::error::Result;

/// In-memory `MemoryIndex`
pub struct InMemoryIndex {
    dimension: usize,
    entries: RwLock<HashMap<Uuid, IndexEntry>>,
}

impl InMemoryIndex {
    /// Create an empty index for vectors of length `dimension`
    pub fn new(dimension: usize) -> Self {
        InMemoryIndex {
            dimension,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the index holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryIndex for InMemoryIndex {
    fn id(&self) -> &str {
        "memory"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        check_dimension(self.dimension, &entry.vector)?;

        debug!(id = %entry.id, "Upserting memory");
        self.entries.write().await.insert(entry.id, entry);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>> {
        check_top_k(top_k)?;
        check_dimension(self.dimension, vector)?;

        let entries = self.entries.read().await;

        // Filter first, then rank: the cutoff applies to the filtered set
        let mut matches: Vec<IndexMatch> = entries
            .values()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.metadata)))
            .map(|entry| IndexMatch {
                id: entry.id,
                score: cosine_similarity(vector, &entry.vector),
                metadata: entry.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.metadata.created_at.cmp(&a.metadata.created_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn describe(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            total_records: self.entries.read().await.len() as u64,
            dimension: self.dimension,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FilterField, Importance, MemoryMetadata};
    use crate::error::Error;
    use chrono::Utc;

    fn entry(text: &str, category: Option<&str>, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            id: Uuid::new_v4(),
            vector,
            metadata: MemoryMetadata {
                text: text.to_string(),
                category: category.map(str::to_string),
                entities: vec![],
                importance: Importance::Medium,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_similarity() {
        let index = InMemoryIndex::new(2);
        index.upsert(entry("far", None, vec![0.0, 1.0])).await.unwrap();
        index.upsert(entry("near", None, vec![1.0, 0.1])).await.unwrap();
        index.upsert(entry("middle", None, vec![1.0, 1.0])).await.unwrap();

        let results = index.query(&[1.0, 0.0], 10, None).await.unwrap();
        let texts: Vec<&str> = results.iter().map(|m| m.metadata.text.as_str()).collect();
        assert_eq!(texts, vec!["near", "middle", "far"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_filter_applies_before_top_k() {
        let index = InMemoryIndex::new(2);
        // Three closer unfiltered matches would crowd out the meeting in a
        // filter-after-top-k implementation
        for i in 0..3 {
            index
                .upsert(entry(&format!("task {}", i), Some("task"), vec![1.0, 0.0]))
                .await
                .unwrap();
        }
        index
            .upsert(entry("meeting", Some("meeting"), vec![0.2, 1.0]))
            .await
            .unwrap();

        let filter = MetadataFilter::new().eq(FilterField::Category, "meeting");
        let results = index.query(&[1.0, 0.0], 1, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.text, "meeting");
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let index = InMemoryIndex::new(2);
        let mut first = entry("original", None, vec![1.0, 0.0]);
        index.upsert(first.clone()).await.unwrap();

        first.metadata.text = "replacement".into();
        index.upsert(first).await.unwrap();

        assert_eq!(index.len().await, 1);
        let results = index.query(&[1.0, 0.0], 5, None).await.unwrap();
        assert_eq!(results[0].metadata.text, "replacement");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_leaves_index_unchanged() {
        let index = InMemoryIndex::new(3);
        let result = index.upsert(entry("short", None, vec![1.0, 0.0])).await;

        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 3, actual: 2 })
        ));
        assert!(index.is_empty().await);
        assert!(matches!(
            index.query(&[1.0], 1, None).await,
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let index = InMemoryIndex::new(2);
        assert!(matches!(
            index.query(&[1.0, 0.0], 0, None).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_describe() {
        let index = InMemoryIndex::new(2);
        index.upsert(entry("one", None, vec![1.0, 0.0])).await.unwrap();

        let stats = index.describe().await.unwrap();
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.dimension, 2);
    }
}
