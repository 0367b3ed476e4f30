//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use super::types::provider::AzureOpenAiConfig;
use super::types::storage::{PostgresConfig, StorageBackendType};
use super::types::Config;
use crate::error::{Error, Result};

/// A snapshot of the configuration file
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    /// Path to the config file
    pub path: PathBuf,
    /// Whether the file exists
    pub exists: bool,
    /// Parsed configuration
    pub config: Option<Config>,
    /// Problems reading or parsing the file
    pub issues: Vec<String>,
}

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads `.env` first, then overlays any set environment variables. Env vars
/// have the highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    dotenvy::dotenv().ok();
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Overlay values from `lookup` onto `config`
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    // Gateway
    if let Some(key) = lookup("API_SECRET_KEY") {
        config.gateway.auth.api_key = Some(SecretString::from(key));
    }
    if let Some(bind) = lookup("GATEWAY_BIND") {
        config.gateway.bind = bind;
    }
    if let Some(port) = lookup("GATEWAY_PORT") {
        config.gateway.port = parse_var("GATEWAY_PORT", &port)?;
    }

    // Embedding
    if let Some(provider) = lookup("EMBEDDING_PROVIDER") {
        config.embedding.provider = provider.parse()?;
    }
    if let Some(model) = lookup("EMBEDDING_MODEL") {
        config.embedding.model = model;
    }
    if let Some(dims) = lookup("EMBEDDING_DIMENSIONS") {
        config.embedding.dimensions = parse_var("EMBEDDING_DIMENSIONS", &dims)?;
    }
    if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
        let azure = config
            .embedding
            .azure
            .get_or_insert_with(|| AzureOpenAiConfig::new(String::new(), SecretString::from(String::new())));
        azure.endpoint = endpoint;
    }
    if let Some(ref mut azure) = config.embedding.azure {
        if let Some(api_key) = lookup("AZURE_OPENAI_API_KEY") {
            azure.api_key = SecretString::from(api_key);
        }
        if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT") {
            azure.deployment = deployment;
        }
        if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
            azure.api_version = version;
        }
    }

    // Storage
    if let Some(database_url) = lookup("DATABASE_URL") {
        let pg = config
            .storage
            .postgres
            .get_or_insert_with(|| PostgresConfig::new(String::new()));
        pg.url = SecretString::from(database_url);
        config.storage.backend = StorageBackendType::Postgres;
    }
    if let Some(ref mut pg) = config.storage.postgres {
        if let Some(max_conn) = lookup("DATABASE_MAX_CONNECTIONS") {
            pg.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", &max_conn)?;
        }
        if let Some(timeout) = lookup("DATABASE_TIMEOUT") {
            pg.connect_timeout_secs = parse_var("DATABASE_TIMEOUT", &timeout)?;
        }
    }
    if let Some(backend) = lookup("STORAGE_BACKEND") {
        config.storage.backend = backend.parse()?;
    }

    // Recall policy
    if let Some(top_k) = lookup("RECALL_TOP_K") {
        config.recall.top_k = parse_var("RECALL_TOP_K", &top_k)?;
    }
    if let Some(min_relevance) = lookup("RECALL_MIN_RELEVANCE") {
        config.recall.min_relevance = parse_var("RECALL_MIN_RELEVANCE", &min_relevance)?;
    }
    if let Some(factor) = lookup("RECALL_OVERFETCH_FACTOR") {
        config.recall.overfetch_factor = parse_var("RECALL_OVERFETCH_FACTOR", &factor)?;
    }

    // Logging
    if let Some(format) = lookup("LOG_FORMAT") {
        config.log.format = format.parse()?;
    }

    Ok(())
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {} ({})", name, raw, e)))
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

/// Read a configuration file into a snapshot
pub fn read_config_snapshot(path: &Path) -> ConfigSnapshot {
    if !path.exists() {
        return ConfigSnapshot {
            path: path.to_path_buf(),
            exists: false,
            config: None,
            issues: vec!["Configuration file does not exist".to_string()],
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            config: Some(config),
            issues: Vec::new(),
        },
        Err(e) => ConfigSnapshot {
            path: path.to_path_buf(),
            exists: true,
            config: None,
            issues: vec![e.to_string()],
        },
    }
}
