//! Embedding generation
//!
//! Two providers sit behind the `Embedder` trait:
//! - `LocalEmbedder`: fastembed, all-MiniLM-L6-v2 by default (384 dimensions).
//!   The model auto-downloads on first use and is loaded once per process.
//! - `AzureOpenAiEmbedder`: the Azure OpenAI embeddings REST endpoint.
//!
//! Provider failures surface as `EmbeddingUnavailable`. There is no fallback
//! from one provider to the other: their vectors are not comparable.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use super::cache::CachedEmbedder;
use crate::config::{AzureOpenAiConfig, EmbeddingConfig, EmbeddingProvider};
use crate::error::{Error, Result};

/// Maps text to a fixed-length vector, deterministically
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Provider identifier, for logs and status output
    fn id(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;

    /// Embed a single non-empty text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Reject text that is empty after trimming
pub fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::InvalidInput("text must not be empty".into()));
    }
    Ok(())
}

fn check_output(expected: usize, vector: Vec<f32>) -> Result<Vec<f32>> {
    if vector.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(vector)
}

/// Build the configured embedder, wrapped in a cache when enabled
pub async fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::Local => Arc::new(LocalEmbedder::load(config).await?),
        EmbeddingProvider::Azure => {
            let azure = config.azure.as_ref().ok_or_else(|| {
                Error::Config("Azure embedding provider selected but embedding.azure is missing".into())
            })?;
            Arc::new(AzureOpenAiEmbedder::new(azure, config.dimensions)?)
        }
    };

    if config.cache.capacity == 0 {
        return Ok(embedder);
    }

    Ok(Arc::new(CachedEmbedder::new(embedder, &config.cache)))
}

// ============================================================================
// Local (fastembed)
// ============================================================================

struct LoadedModel {
    name: &'static str,
    model: Arc<TextEmbedding>,
}

/// Process-wide model, initialized once before first use
static MODEL: OnceCell<LoadedModel> = OnceCell::const_new();

/// Resolve a configured model name to its fastembed model, canonical name and
/// native dimension
fn resolve_model(name: &str) -> Result<(EmbeddingModel, &'static str, usize)> {
    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Ok((EmbeddingModel::AllMiniLML6V2, "all-minilm-l6-v2", 384))
        }
        "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => {
            Ok((EmbeddingModel::BGESmallENV15, "bge-small-en-v1.5", 384))
        }
        "multilingual-e5-small" | "intfloat/multilingual-e5-small" => {
            Ok((EmbeddingModel::MultilingualE5Small, "multilingual-e5-small", 384))
        }
        _ => Err(Error::Config(format!(
            "Unsupported local embedding model: {}. Valid options: all-minilm-l6-v2, bge-small-en-v1.5, multilingual-e5-small",
            name
        ))),
    }
}

/// Local embedding service wrapping fastembed
#[derive(Clone)]
pub struct LocalEmbedder {
    name: &'static str,
    dimensions: usize,
    model: Arc<TextEmbedding>,
}

impl LocalEmbedder {
    /// Load (or reuse) the process-wide model named in `config`
    pub async fn load(config: &EmbeddingConfig) -> Result<Self> {
        let (kind, name, native_dims) = resolve_model(&config.model)?;
        if native_dims != config.dimensions {
            return Err(Error::Config(format!(
                "Model {} produces {} dimensions but embedding.dimensions is {}",
                name, native_dims, config.dimensions
            )));
        }

        let loaded = MODEL
            .get_or_try_init(|| async move {
                info!("Loading embedding model {}", name);
                let model = tokio::task::spawn_blocking(move || {
                    TextEmbedding::try_new(InitOptions::new(kind).with_show_download_progress(true))
                })
                .await
                .map_err(|e| Error::EmbeddingUnavailable(format!("Model load task failed: {}", e)))?
                .map_err(|e| Error::EmbeddingUnavailable(format!("Failed to init embedding model: {}", e)))?;
                info!("Embedding model {} ready", name);

                Ok::<_, Error>(LoadedModel {
                    name,
                    model: Arc::new(model),
                })
            })
            .await?;

        if loaded.name != name {
            return Err(Error::Config(format!(
                "Embedding model {} is already loaded; cannot switch to {} within one process",
                loaded.name, name
            )));
        }

        Ok(LocalEmbedder {
            name: loaded.name,
            dimensions: native_dims,
            model: loaded.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    fn id(&self) -> &str {
        self.name
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;

        let model = self.model.clone();
        let text = text.to_string();

        let vector = tokio::task::spawn_blocking(move || {
            let embeddings = model
                .embed(vec![text], None)
                .map_err(|e| Error::EmbeddingUnavailable(format!("Embedding error: {}", e)))?;
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| Error::EmbeddingUnavailable("No embedding returned".into()))
        })
        .await
        .map_err(|e| Error::EmbeddingUnavailable(format!("Embedding task join error: {}", e)))??;

        check_output(self.dimensions, vector)
    }
}

// ============================================================================
// Azure OpenAI
// ============================================================================

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embeddings from an Azure OpenAI deployment
#[derive(Clone)]
pub struct AzureOpenAiEmbedder {
    client: reqwest::Client,
    url: Url,
    api_key: SecretString,
    dimensions: usize,
}

impl AzureOpenAiEmbedder {
    /// Create a client for the deployment described by `config`
    pub fn new(config: &AzureOpenAiConfig, dimensions: usize) -> Result<Self> {
        let mut endpoint = config.endpoint.trim().to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        let mut url = Url::parse(&endpoint)
            .and_then(|base| base.join(&format!("openai/deployments/{}/embeddings", config.deployment)))
            .map_err(|e| Error::Config(format!("Invalid Azure OpenAI endpoint {}: {}", config.endpoint, e)))?;
        url.query_pairs_mut()
            .append_pair("api-version", &config.api_version);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(AzureOpenAiEmbedder {
            client,
            url,
            api_key: config.api_key.clone(),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbedder {
    fn id(&self) -> &str {
        "azure-openai"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        validate_text(text)?;

        let response = self
            .client
            .post(self.url.clone())
            .header("api-key", self.api_key.expose_secret())
            .json(&EmbeddingRequest { input: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!(
                "Azure OpenAI returned {}: {}",
                status, body
            )));
        }

        let body: EmbeddingResponse = response.json().await?;
        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::EmbeddingUnavailable("No embedding returned".into()))?;

        debug!("Azure OpenAI embedding: {} dimensions", vector.len());
        check_output(self.dimensions, vector)
    }
}
