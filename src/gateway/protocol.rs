//! Gateway wire types
//!
//! JSON request/response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{parse_entities, QueryResult};

// ============================================================================
// Store
// ============================================================================

/// Entities as a comma-separated string or a JSON array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityList {
    /// `"John, Tuesday"`
    Csv(String),
    /// `["John", "Tuesday"]`
    List(Vec<String>),
}

impl EntityList {
    /// Normalized entity list, blanks dropped
    pub fn into_vec(self) -> Vec<String> {
        match self {
            EntityList::Csv(raw) => parse_entities(&raw),
            EntityList::List(items) => items
                .into_iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }
}

/// `POST /api/store-memory` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMemoryRequest {
    /// Statement to remember
    pub content: String,
    /// Category tag
    #[serde(default)]
    pub memory_type: Option<String>,
    /// Salient terms
    #[serde(default)]
    pub entities: Option<EntityList>,
    /// `low`, `medium` or `high`
    #[serde(default)]
    pub priority: Option<String>,
}

/// `POST /api/store-memory` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMemoryResponse {
    pub success: bool,
    pub memory_id: Uuid,
    pub message: String,
}

// ============================================================================
// Search
// ============================================================================

/// `POST /api/search-memory` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMemoryRequest {
    /// Natural-language query
    pub query: String,
    /// Maximum number of matches
    #[serde(default)]
    pub top_k: Option<i64>,
    /// Only match this category
    #[serde(default)]
    pub memory_type: Option<String>,
    /// Only `today` is understood
    #[serde(default)]
    pub time_range: Option<String>,
    /// Override the relevance threshold
    #[serde(default)]
    pub min_relevance: Option<f32>,
}

/// A single search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMatch {
    pub id: Uuid,
    pub text: String,
    pub score: f32,
    pub category: Option<String>,
    /// Comma-separated, as accepted on store
    pub entities: String,
    pub importance: String,
    pub created_at: DateTime<Utc>,
}

impl From<QueryResult> for MemoryMatch {
    fn from(result: QueryResult) -> Self {
        MemoryMatch {
            id: result.id,
            text: result.metadata.text,
            score: result.score,
            category: result.metadata.category,
            entities: result.metadata.entities.join(", "),
            importance: result.metadata.importance.to_string(),
            created_at: result.metadata.created_at,
        }
    }
}

/// `POST /api/search-memory` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMemoryResponse {
    pub success: bool,
    pub matches: Vec<MemoryMatch>,
    pub count: usize,
}

// ============================================================================
// Status
// ============================================================================

/// `GET /` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub version: String,
}

/// `GET /api/health` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthResponse {
    Healthy {
        index_connected: bool,
        total_vectors: u64,
        dimension: usize,
        timestamp: DateTime<Utc>,
    },
    Unhealthy {
        index_connected: bool,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

/// Error body for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
