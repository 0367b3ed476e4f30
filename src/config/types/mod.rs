//! Configuration types module

pub mod provider;
pub mod storage;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: provider::EmbeddingConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: storage::StorageConfig,

    /// Recall policy
    #[serde(default)]
    pub recall: RecallConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from defaults, the config file (if present) and
    /// environment variable overrides
    pub fn from_env() -> crate::error::Result<Self> {
        crate::config::load_config()
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            port: default_port(),
            bind: default_bind(),
            auth: AuthConfig::default(),
        }
    }
}

fn default_port() -> u16 {
    8000
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared bearer token callers must present
    #[serde(skip_serializing, default)]
    pub api_key: Option<SecretString>,
}

/// Recall policy defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Candidates requested when the caller gives no `top_k`
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Largest `top_k` a caller may request
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    /// Minimum cosine similarity for a candidate to be returned
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,
    /// Multiplier on `top_k` for the raw index query (1 = no over-fetch)
    #[serde(default = "default_overfetch_factor")]
    pub overfetch_factor: usize,
}

impl Default for RecallConfig {
    fn default() -> Self {
        RecallConfig {
            top_k: default_top_k(),
            max_top_k: default_max_top_k(),
            min_relevance: default_min_relevance(),
            overfetch_factor: default_overfetch_factor(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    100
}

fn default_min_relevance() -> f32 {
    0.7
}

fn default_overfetch_factor() -> usize {
    1
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid log format: {}. Valid options: pretty, json",
                s
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info,memory_assistant=debug,sqlx=warn".to_string()
}
