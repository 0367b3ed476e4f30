//! Embedding provider configuration types
//!
//! Configuration for the local fastembed model and the Azure OpenAI
//! embeddings endpoint.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which embedder produces vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// In-process fastembed model
    #[default]
    Local,
    /// Azure OpenAI embeddings deployment
    Azure,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "local" | "fastembed" => Ok(EmbeddingProvider::Local),
            "azure" | "azure-openai" => Ok(EmbeddingProvider::Azure),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid embedding provider: {}. Valid options: local, azure",
                s
            ))),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Local => write!(f, "local"),
            EmbeddingProvider::Azure => write!(f, "azure"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider
    #[serde(default)]
    pub provider: EmbeddingProvider,
    /// Local model name
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Embedding dimensions; the index is created with the same value
    #[serde(default = "default_embedding_dims")]
    pub dimensions: usize,
    /// Embedding cache settings
    #[serde(default)]
    pub cache: EmbeddingCacheConfig,
    /// Azure OpenAI settings (required when provider = azure)
    pub azure: Option<AzureOpenAiConfig>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig {
            provider: EmbeddingProvider::default(),
            model: default_embedding_model(),
            dimensions: default_embedding_dims(),
            cache: EmbeddingCacheConfig::default(),
            azure: None,
        }
    }
}

fn default_embedding_model() -> String {
    "all-minilm-l6-v2".to_string()
}

fn default_embedding_dims() -> usize {
    384
}

/// In-process embedding cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingCacheConfig {
    /// Maximum cached texts (0 disables the cache)
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    /// Time-to-live per entry
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        EmbeddingCacheConfig {
            capacity: default_cache_capacity(),
            ttl: default_cache_ttl(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    1000
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Azure OpenAI embeddings configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureOpenAiConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// API key
    #[serde(skip_serializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Deployment name of the embedding model
    #[serde(default = "default_azure_deployment")]
    pub deployment: String,
    /// REST API version
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
    /// Request timeout
    #[serde(default = "default_azure_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl AzureOpenAiConfig {
    /// Create a config with default deployment, API version and timeout
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Self {
        AzureOpenAiConfig {
            endpoint: endpoint.into(),
            api_key,
            deployment: default_azure_deployment(),
            api_version: default_azure_api_version(),
            timeout: default_azure_timeout(),
        }
    }
}

fn default_azure_deployment() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_azure_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_azure_timeout() -> Duration {
    Duration::from_secs(30)
}
