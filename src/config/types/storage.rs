//! Storage configuration types
//!
//! Configuration for the vector index backend (PostgreSQL + pgvector or
//! process-local).

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Vector index backend
    #[serde(default)]
    pub backend: StorageBackendType,
    /// PostgreSQL configuration
    pub postgres: Option<PostgresConfig>,
}

/// Storage backend type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendType {
    /// PostgreSQL with pgvector
    Postgres,
    /// In-memory (no persistence)
    #[default]
    Memory,
}

impl std::str::FromStr for StorageBackendType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgvector" => Ok(StorageBackendType::Postgres),
            "memory" | "in-memory" => Ok(StorageBackendType::Memory),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid storage backend: {}. Valid options: postgres, memory",
                s
            ))),
        }
    }
}

impl std::fmt::Display for StorageBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendType::Postgres => write!(f, "postgres"),
            StorageBackendType::Memory => write!(f, "memory"),
        }
    }
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Database URL
    #[serde(skip_serializing)]
    pub url: SecretString,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PostgresConfig {
    /// Create a config for `url` with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        PostgresConfig {
            url: SecretString::from(url.into()),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackendType::Memory);
        assert!(config.postgres.is_none());
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(
            "pgvector".parse::<StorageBackendType>().unwrap(),
            StorageBackendType::Postgres
        );
        assert_eq!(
            "memory".parse::<StorageBackendType>().unwrap(),
            StorageBackendType::Memory
        );
        assert!("pinecone".parse::<StorageBackendType>().is_err());
    }
}
