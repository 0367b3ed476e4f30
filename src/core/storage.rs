//! Storage traits - Abstract interface for the vector index
//!
//! `MemoryIndex` is the seam between the memory service and whatever holds
//! the vectors:
//! - PostgreSQL + pgvector for durable deployments
//! - a process-local map for development and tests
//!
//! Consistency of concurrent `upsert`/`query` calls is the backend's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::filter::MetadataFilter;
use super::types::{MemoryMetadata, MemoryRecord};
use crate::error::{Error, Result};

/// A vector plus its payload, as written to the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Associated metadata
    pub metadata: MemoryMetadata,
}

impl From<MemoryRecord> for IndexEntry {
    fn from(record: MemoryRecord) -> Self {
        IndexEntry {
            id: record.id,
            vector: record.vector,
            metadata: record.metadata,
        }
    }
}

/// A nearest-neighbour hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    /// Identifier of the stored entry
    pub id: Uuid,
    /// Cosine similarity, higher is more similar
    pub score: f32,
    /// Stored metadata
    pub metadata: MemoryMetadata,
}

/// Index reachability report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored entries
    pub total_records: u64,
    /// Vector dimension the index was initialized with
    pub dimension: usize,
}

/// Abstract interface for vector/embedding storage
#[async_trait]
pub trait MemoryIndex: Send + Sync {
    /// Get the backend ID
    fn id(&self) -> &str;

    /// Vector dimension every entry must have
    fn dimension(&self) -> usize;

    /// Insert or replace the entry with `entry.id`
    async fn upsert(&self, entry: IndexEntry) -> Result<()>;

    /// Top `top_k` entries passing `filter`, by descending similarity
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>>;

    /// Reachability and size, without mutating anything
    async fn describe(&self) -> Result<IndexStats>;
}

/// Reject vectors whose length differs from the index dimension
pub fn check_dimension(expected: usize, vector: &[f32]) -> Result<()> {
    if vector.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Reject non-positive candidate counts
pub fn check_top_k(top_k: usize) -> Result<()> {
    if top_k == 0 {
        return Err(Error::InvalidInput("top_k must be a positive integer".into()));
    }
    Ok(())
}
