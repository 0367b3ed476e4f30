//! Memory service - remember and recall
//!
//! Embeds text through an `Embedder` and talks to a `MemoryIndex`. Recall
//! applies the relevance threshold and the top-k cut after the index has
//! ranked the filtered candidates.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::embedding::{validate_text, Embedder};
use crate::config::RecallConfig;
use crate::core::{
    Condition, FilterField, Importance, IndexEntry, IndexStats, MemoryIndex, MemoryMetadata,
    MemoryRecord, MetadataFilter, QueryResult,
};
use crate::error::{Error, Result};

/// A statement to store
#[derive(Debug, Clone, Default)]
pub struct RememberRequest {
    /// The statement, stored as given
    pub text: String,
    /// Optional classification tag
    pub category: Option<String>,
    /// Salient terms
    pub entities: Vec<String>,
    /// Priority signal
    pub importance: Importance,
}

impl RememberRequest {
    /// Create a request with default metadata
    pub fn new(text: impl Into<String>) -> Self {
        RememberRequest {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the entities
    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    /// Set the importance
    pub fn with_importance(mut self, importance: Importance) -> Self {
        self.importance = importance;
        self
    }
}

/// Per-call recall parameters; unset values fall back to the service policy
#[derive(Debug, Clone, Default)]
pub struct RecallOptions {
    /// Only return memories with exactly this category
    pub category: Option<String>,
    /// Additional conditions, all of which must hold
    pub filter: MetadataFilter,
    /// Maximum number of results
    pub top_k: Option<usize>,
    /// Minimum cosine similarity
    pub min_relevance: Option<f32>,
}

impl RecallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.filter = self.filter.and(condition);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = Some(min_relevance);
        self
    }
}

/// Stores statements and recalls them by meaning
#[derive(Clone)]
pub struct MemoryService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn MemoryIndex>,
    policy: RecallConfig,
}

impl MemoryService {
    /// Pair an embedder with an index of the same dimension
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn MemoryIndex>,
        policy: RecallConfig,
    ) -> Result<Self> {
        if embedder.dimensions() != index.dimension() {
            return Err(Error::DimensionMismatch {
                expected: index.dimension(),
                actual: embedder.dimensions(),
            });
        }

        info!(
            embedder = embedder.id(),
            index = index.id(),
            dimension = index.dimension(),
            "Memory service ready"
        );

        Ok(MemoryService {
            embedder,
            index,
            policy,
        })
    }

    /// Recall defaults in effect
    pub fn policy(&self) -> &RecallConfig {
        &self.policy
    }

    /// Embed and store a statement
    pub async fn remember(&self, request: RememberRequest) -> Result<MemoryRecord> {
        validate_text(&request.text)?;

        let category = request
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let vector = self.embedder.embed(&request.text).await?;
        let record = MemoryRecord {
            id: Uuid::new_v4(),
            vector,
            metadata: MemoryMetadata {
                text: request.text,
                category,
                entities: request.entities,
                importance: request.importance,
                created_at: Utc::now(),
            },
        };

        self.index.upsert(IndexEntry::from(record.clone())).await?;

        debug!(id = %record.id, category = ?record.metadata.category, "Stored memory");
        Ok(record)
    }

    /// Memories similar to `query`, best first
    pub async fn recall(&self, query: &str, options: RecallOptions) -> Result<Vec<QueryResult>> {
        validate_text(query)?;

        let top_k = options.top_k.unwrap_or(self.policy.top_k);
        if top_k == 0 || top_k > self.policy.max_top_k {
            return Err(Error::InvalidInput(format!(
                "top_k must be between 1 and {}",
                self.policy.max_top_k
            )));
        }

        let min_relevance = options.min_relevance.unwrap_or(self.policy.min_relevance);
        if !min_relevance.is_finite() {
            return Err(Error::InvalidInput("min_relevance must be a finite number".into()));
        }

        let mut filter = MetadataFilter::new();
        if let Some(category) = options.category {
            filter = filter.eq(FilterField::Category, category);
        }
        filter.extend(options.filter.conditions().iter().cloned());

        let vector = self.embedder.embed(query).await?;
        let fetch = top_k.saturating_mul(self.policy.overfetch_factor.max(1));
        let candidates = self
            .index
            .query(&vector, fetch, (!filter.is_empty()).then_some(&filter))
            .await?;
        let candidate_count = candidates.len();

        let mut results: Vec<QueryResult> = candidates
            .into_iter()
            .filter(|m| m.score >= min_relevance)
            .map(|m| QueryResult {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect();
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        debug!(
            candidates = candidate_count,
            returned = results.len(),
            top_k,
            min_relevance,
            "Recalled memories"
        );
        Ok(results)
    }

    /// Index reachability and size
    pub async fn status(&self) -> Result<IndexStats> {
        self.index.describe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FilterOp;
    use crate::test_support::{FixtureEmbedder, RecordingIndex, UnavailableEmbedder, UnavailableIndex};

    const DIM: usize = 64;

    fn service_with(embedder: FixtureEmbedder) -> (MemoryService, Arc<RecordingIndex>) {
        let index = Arc::new(RecordingIndex::new(embedder.dimensions()));
        let service =
            MemoryService::new(Arc::new(embedder), index.clone(), RecallConfig::default()).unwrap();
        (service, index)
    }

    fn permissive() -> RecallOptions {
        RecallOptions::new().with_top_k(10).with_min_relevance(-1.0)
    }

    #[tokio::test]
    async fn test_meeting_scenario() {
        let embedder = FixtureEmbedder::new(4)
            .with("Meeting with John on Tuesday at 3pm", vec![1.0, 0.0, 0.0, 0.0])
            .with("The weather is sunny today", vec![0.0, 1.0, 0.0, 0.0])
            .with("When is my meeting with John?", vec![0.9, 0.1, 0.0, 0.0]);
        let (service, _) = service_with(embedder);

        let meeting = service
            .remember(
                RememberRequest::new("Meeting with John on Tuesday at 3pm")
                    .with_category("meeting")
                    .with_entities(vec!["John".into(), "Tuesday".into()]),
            )
            .await
            .unwrap();
        service
            .remember(RememberRequest::new("The weather is sunny today"))
            .await
            .unwrap();

        let results = service
            .recall("When is my meeting with John?", RecallOptions::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, meeting.id);
        assert!(results[0].score >= 0.7);
        assert_eq!(results[0].metadata.category.as_deref(), Some("meeting"));
        assert_eq!(results[0].metadata.entities, vec!["John", "Tuesday"]);
    }

    #[tokio::test]
    async fn test_unrelated_query_recalls_nothing() {
        let embedder = FixtureEmbedder::new(4)
            .with("Meeting with John on Tuesday at 3pm", vec![1.0, 0.0, 0.0, 0.0])
            .with("What's the weather today?", vec![0.0, 1.0, 0.0, 0.0]);
        let (service, _) = service_with(embedder);

        service
            .remember(RememberRequest::new("Meeting with John on Tuesday at 3pm").with_category("meeting"))
            .await
            .unwrap();

        let results = service
            .recall("What's the weather today?", RecallOptions::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip_recall() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        service.remember(RememberRequest::new("buy oat milk")).await.unwrap();
        let record = service
            .remember(RememberRequest::new("dentist appointment on friday"))
            .await
            .unwrap();

        let results = service
            .recall("dentist appointment on friday", RecallOptions::new())
            .await
            .unwrap();

        assert_eq!(results[0].id, record.id);
        assert!((results[0].score - 1.0).abs() < 1e-5);
        assert_eq!(results[0].metadata.text, "dentist appointment on friday");
    }

    #[tokio::test]
    async fn test_threshold_is_monotonic() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        for text in [
            "project alpha deadline friday",
            "project alpha kickoff",
            "project beta review",
            "groceries eggs bread",
        ] {
            service.remember(RememberRequest::new(text)).await.unwrap();
        }

        let mut previous: Option<Vec<Uuid>> = None;
        for threshold in [-1.0, 0.0, 0.3, 0.5, 0.7, 0.9] {
            let ids: Vec<Uuid> = service
                .recall(
                    "project alpha deadline",
                    RecallOptions::new().with_top_k(10).with_min_relevance(threshold),
                )
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.id)
                .collect();

            if let Some(looser) = &previous {
                assert!(ids.iter().all(|id| looser.contains(id)));
            }
            previous = Some(ids);
        }
    }

    #[tokio::test]
    async fn test_threshold_boundary_is_inclusive() {
        let embedder = FixtureEmbedder::new(2)
            .with("stored", vec![1.0, 0.0])
            .with("probe", vec![1.0, 0.0]);
        let (service, _) = service_with(embedder);
        service.remember(RememberRequest::new("stored")).await.unwrap();

        let results = service
            .recall("probe", RecallOptions::new().with_min_relevance(1.0))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_top_k_bound_and_ordering() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        for i in 0..8 {
            service
                .remember(RememberRequest::new(format!("note number {} about rust", i)))
                .await
                .unwrap();
        }

        for k in [1, 3, 5] {
            let results = service
                .recall("note about rust", permissive().with_top_k(k))
                .await
                .unwrap();
            assert_eq!(results.len(), k);
            assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[tokio::test]
    async fn test_overfetch_still_truncates() {
        let embedder = FixtureEmbedder::new(DIM);
        let index = Arc::new(RecordingIndex::new(DIM));
        let policy = RecallConfig {
            overfetch_factor: 3,
            ..Default::default()
        };
        let service = MemoryService::new(Arc::new(embedder), index, policy).unwrap();
        for i in 0..6 {
            service
                .remember(RememberRequest::new(format!("standup notes day {}", i)))
                .await
                .unwrap();
        }

        let results = service
            .recall("standup notes", RecallOptions::new().with_top_k(2).with_min_relevance(-1.0))
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_conjunction() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        service
            .remember(
                RememberRequest::new("call John about the budget")
                    .with_category("task")
                    .with_entities(vec!["John".into()]),
            )
            .await
            .unwrap();
        service
            .remember(
                RememberRequest::new("call Mary about the budget")
                    .with_category("task")
                    .with_entities(vec!["Mary".into()]),
            )
            .await
            .unwrap();
        service
            .remember(
                RememberRequest::new("lunch with John about the budget")
                    .with_category("meeting")
                    .with_entities(vec!["John".into()]),
            )
            .await
            .unwrap();

        let options = permissive()
            .with_category("task")
            .with_condition(Condition::new(FilterField::Entities, FilterOp::Eq, "John"));
        let results = service.recall("budget", options).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].metadata.text, "call John about the budget");
        for result in &results {
            assert_eq!(result.metadata.category.as_deref(), Some("task"));
            assert!(result.metadata.entities.contains(&"John".to_string()));
        }
    }

    #[tokio::test]
    async fn test_empty_input_touches_nothing() {
        let embedder = Arc::new(FixtureEmbedder::new(DIM));
        let index = Arc::new(RecordingIndex::new(DIM));
        let service =
            MemoryService::new(embedder.clone(), index.clone(), RecallConfig::default()).unwrap();

        assert!(matches!(
            service.remember(RememberRequest::new("   ")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.recall("", RecallOptions::new()).await,
            Err(Error::InvalidInput(_))
        ));

        assert_eq!(embedder.calls(), 0);
        assert_eq!(index.upserts(), 0);
        assert_eq!(index.queries(), 0);
        assert_eq!(service.status().await.unwrap().total_records, 0);
    }

    #[tokio::test]
    async fn test_invalid_recall_parameters() {
        let (service, index) = service_with(FixtureEmbedder::new(DIM));

        for options in [
            RecallOptions::new().with_top_k(0),
            RecallOptions::new().with_top_k(service.policy().max_top_k + 1),
            RecallOptions::new().with_min_relevance(f32::NAN),
        ] {
            assert!(matches!(
                service.recall("anything", options).await,
                Err(Error::InvalidInput(_))
            ));
        }
        assert_eq!(index.queries(), 0);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_at_construction() {
        let result = MemoryService::new(
            Arc::new(FixtureEmbedder::new(8)),
            Arc::new(RecordingIndex::new(4)),
            RecallConfig::default(),
        );
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch { expected: 4, actual: 8 })
        ));
    }

    #[tokio::test]
    async fn test_no_deduplication() {
        let (service, index) = service_with(FixtureEmbedder::new(DIM));
        let first = service.remember(RememberRequest::new("water the plants")).await.unwrap();
        let second = service.remember(RememberRequest::new("water the plants")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(index.upserts(), 2);
        let results = service.recall("water the plants", RecallOptions::new()).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_category_is_none() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        let record = service
            .remember(RememberRequest::new("pick up parcel").with_category("  "))
            .await
            .unwrap();
        assert_eq!(record.metadata.category, None);
    }

    #[tokio::test]
    async fn test_unavailable_collaborators() {
        let index = Arc::new(RecordingIndex::new(DIM));
        let service = MemoryService::new(
            Arc::new(UnavailableEmbedder::new(DIM)),
            index.clone(),
            RecallConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            service.remember(RememberRequest::new("hello")).await,
            Err(Error::EmbeddingUnavailable(_))
        ));
        assert_eq!(index.upserts(), 0);

        let service = MemoryService::new(
            Arc::new(FixtureEmbedder::new(DIM)),
            Arc::new(UnavailableIndex::new(DIM)),
            RecallConfig::default(),
        )
        .unwrap();
        assert!(matches!(
            service.recall("hello", RecallOptions::new()).await,
            Err(Error::IndexUnavailable(_))
        ));
        assert!(service.status().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_result_is_success() {
        let (service, _) = service_with(FixtureEmbedder::new(DIM));
        let results = service.recall("nothing stored yet", RecallOptions::new()).await.unwrap();
        assert!(results.is_empty());
    }
}
