//! Configuration validation
//!
//! Validates configuration and reports issues.

use secrecy::ExposeSecret;

use super::types::provider::EmbeddingProvider;
use super::types::storage::StorageBackendType;
use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }

    /// Collapse errors into a single `Error::Config`
    pub fn into_result(self) -> crate::error::Result<Vec<ValidationIssue>> {
        if self.valid {
            return Ok(self.warnings);
        }
        let message = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(crate::error::Error::Config(message))
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_gateway_config(config, result);
    result = validate_embedding_config(config, result);
    result = validate_storage_config(config, result);
    result = validate_recall_config(config, result);

    result
}

fn validate_gateway_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let has_key = config
        .gateway
        .auth
        .api_key
        .as_ref()
        .is_some_and(|k| !k.expose_secret().trim().is_empty());

    if !has_key {
        result = result.with_error(
            ValidationIssue::new("gateway.auth.api_key", "No API secret configured; every request would be rejected")
                .with_suggestion("Set the API_SECRET_KEY environment variable"),
        );
    }

    result
}

/// Output width of Azure's text-embedding-ada-002
const ADA_002_DIMENSIONS: usize = 1536;

fn validate_embedding_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.embedding.dimensions == 0 {
        result = result.with_error(ValidationIssue::new(
            "embedding.dimensions",
            "Embedding dimensions must be positive",
        ));
    }

    if config.embedding.provider == EmbeddingProvider::Azure {
        match config.embedding.azure {
            None => {
                result = result.with_error(
                    ValidationIssue::new("embedding.azure", "Azure provider selected but not configured")
                        .with_suggestion("Set AZURE_OPENAI_ENDPOINT and AZURE_OPENAI_API_KEY"),
                );
            }
            Some(ref azure) => {
                if url::Url::parse(&azure.endpoint).is_err() {
                    result = result.with_error(ValidationIssue::new(
                        "embedding.azure.endpoint",
                        format!("Not a valid URL: {:?}", azure.endpoint),
                    ));
                }
                if azure.api_key.expose_secret().is_empty() {
                    result = result.with_error(
                        ValidationIssue::new("embedding.azure.api_key", "Azure API key is empty")
                            .with_suggestion("Set AZURE_OPENAI_API_KEY"),
                    );
                }
                if azure.deployment.contains("ada-002")
                    && config.embedding.dimensions != ADA_002_DIMENSIONS
                {
                    result = result.with_warning(
                        ValidationIssue::new(
                            "embedding.dimensions",
                            format!(
                                "{} returns {} dimensions but {} are configured",
                                azure.deployment, ADA_002_DIMENSIONS, config.embedding.dimensions
                            ),
                        )
                        .with_suggestion(format!("Set EMBEDDING_DIMENSIONS={}", ADA_002_DIMENSIONS)),
                    );
                }
            }
        }
    }

    result
}

fn validate_storage_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.storage.backend {
        StorageBackendType::Postgres => {
            let has_url = config
                .storage
                .postgres
                .as_ref()
                .is_some_and(|pg| !pg.url.expose_secret().is_empty());
            if !has_url {
                result = result.with_error(
                    ValidationIssue::new("storage.postgres", "PostgreSQL backend selected but not configured")
                        .with_suggestion("Set DATABASE_URL environment variable or configure storage.postgres"),
                );
            }
        }
        StorageBackendType::Memory => {
            result = result.with_warning(
                ValidationIssue::new("storage.backend", "In-memory index: memories are lost on restart")
                    .with_suggestion("Set DATABASE_URL to use PostgreSQL + pgvector"),
            );
        }
    }

    result
}

fn validate_recall_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let recall = &config.recall;

    if recall.top_k == 0 || recall.top_k > recall.max_top_k {
        result = result.with_error(ValidationIssue::new(
            "recall.top_k",
            format!("Must be between 1 and max_top_k ({})", recall.max_top_k),
        ));
    }

    if !(-1.0..=1.0).contains(&recall.min_relevance) {
        result = result.with_error(ValidationIssue::new(
            "recall.min_relevance",
            "Cosine similarity threshold must be within [-1, 1]",
        ));
    }

    if recall.overfetch_factor == 0 {
        result = result.with_error(
            ValidationIssue::new("recall.overfetch_factor", "Must be at least 1")
                .with_suggestion("Use 1 to disable over-fetching"),
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::storage::PostgresConfig;
    use crate::config::types::provider::AzureOpenAiConfig;
    use secrecy::SecretString;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.gateway.auth.api_key = Some(SecretString::from("token".to_string()));
        config
    }

    #[test]
    fn test_validate_default_config() {
        let result = validate_config(&Config::default());

        // Missing API key is the only error; in-memory backend is a warning
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "gateway.auth.api_key");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_validate_configured() {
        let mut config = valid_config();
        config.storage.backend = StorageBackendType::Postgres;
        config.storage.postgres = Some(PostgresConfig::new("postgres://localhost/memories"));

        let result = validate_config(&config);
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_azure_without_settings() {
        let mut config = valid_config();
        config.embedding.provider = EmbeddingProvider::Azure;

        let result = validate_config(&config);
        assert!(result.errors.iter().any(|e| e.path == "embedding.azure"));
    }

    #[test]
    fn test_validate_azure_dimension_mismatch() {
        let mut config = valid_config();
        config.embedding.provider = EmbeddingProvider::Azure;
        config.embedding.azure = Some(AzureOpenAiConfig::new(
            "https://example.openai.azure.com",
            SecretString::from("key".to_string()),
        ));

        let result = validate_config(&config);
        assert!(result.valid);
        let warning = result
            .warnings
            .iter()
            .find(|w| w.path == "embedding.dimensions")
            .unwrap();
        assert!(warning.message.contains("1536"));
        assert_eq!(warning.suggestion.as_deref(), Some("Set EMBEDDING_DIMENSIONS=1536"));

        config.embedding.dimensions = 1536;
        let result = validate_config(&config);
        assert!(result.warnings.iter().all(|w| w.path != "embedding.dimensions"));
    }

    #[test]
    fn test_validate_recall_bounds() {
        let mut config = valid_config();
        config.recall.min_relevance = 1.5;
        config.recall.overfetch_factor = 0;
        config.recall.top_k = 0;

        let err = validate_config(&config).into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("recall.min_relevance"));
        assert!(message.contains("recall.overfetch_factor"));
        assert!(message.contains("recall.top_k"));
    }
}
