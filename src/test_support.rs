//! Deterministic embedders and indexes for unit tests

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::core::{IndexEntry, IndexMatch, IndexStats, MemoryIndex, MetadataFilter};
use crate::database::InMemoryIndex;
use crate::error::{Error, Result};
use crate::memory::embedding::{validate_text, Embedder};

/// Embeds registered texts to fixed vectors and anything else as a hashed
/// bag of words
pub struct FixtureEmbedder {
    dimensions: usize,
    fixtures: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
}

impl FixtureEmbedder {
    pub fn new(dimensions: usize) -> Self {
        FixtureEmbedder {
            dimensions,
            fixtures: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimensions);
        self.fixtures.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn bag_of_words(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for FixtureEmbedder {
    fn id(&self) -> &str {
        "fixture"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .fixtures
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.bag_of_words(text)))
    }
}

/// Embedder whose provider is always down
pub struct UnavailableEmbedder {
    dimensions: usize,
}

impl UnavailableEmbedder {
    pub fn new(dimensions: usize) -> Self {
        UnavailableEmbedder { dimensions }
    }
}

#[async_trait]
impl Embedder for UnavailableEmbedder {
    fn id(&self) -> &str {
        "unavailable"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::EmbeddingUnavailable("model not loaded".into()))
    }
}

/// In-memory index that counts calls
pub struct RecordingIndex {
    inner: InMemoryIndex,
    upserts: AtomicUsize,
    queries: AtomicUsize,
}

impl RecordingIndex {
    pub fn new(dimension: usize) -> Self {
        RecordingIndex {
            inner: InMemoryIndex::new(dimension),
            upserts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MemoryIndex for RecordingIndex {
    fn id(&self) -> &str {
        "recording"
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(entry).await
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(vector, top_k, filter).await
    }

    async fn describe(&self) -> Result<IndexStats> {
        self.inner.describe().await
    }
}

/// Index whose service is always down
pub struct UnavailableIndex {
    dimension: usize,
}

impl UnavailableIndex {
    pub fn new(dimension: usize) -> Self {
        UnavailableIndex { dimension }
    }
}

#[async_trait]
impl MemoryIndex for UnavailableIndex {
    fn id(&self) -> &str {
        "unavailable"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, _entry: IndexEntry) -> Result<()> {
        Err(Error::IndexUnavailable("connection refused".into()))
    }

    async fn query(
        &self,
        _vector: &[f32],
        _top_k: usize,
        _filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>> {
        Err(Error::IndexUnavailable("connection refused".into()))
    }

    async fn describe(&self) -> Result<IndexStats> {
        Err(Error::IndexUnavailable("connection refused".into()))
    }
}
