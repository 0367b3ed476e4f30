//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, GatewayConfig, RecallConfig, ...)
//! - types/provider.rs: Embedding provider configuration
//! - types/storage.rs: Vector index backend configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{AuthConfig, Config, GatewayConfig, LogConfig, LogFormat, RecallConfig};

// Re-export provider types
pub use types::provider::{
    AzureOpenAiConfig, EmbeddingCacheConfig, EmbeddingConfig, EmbeddingProvider,
};

// Re-export storage types
pub use types::storage::{PostgresConfig, StorageBackendType, StorageConfig};

// Re-export IO and utilities
pub use io::{
    apply_env_overrides, apply_overrides, load_config, load_config_from_path,
    read_config_snapshot, save_config, ConfigSnapshot,
};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
