//! Database module - vector index backends
//!
//! - PostgreSQL with pgvector: durable semantic memory
//! - In-memory map: development and tests

mod in_memory;
mod memory;
mod postgres;

use std::sync::Arc;

use tracing::info;

use crate::config::{Config, PostgresConfig, StorageBackendType};
use crate::core::MemoryIndex;
use crate::error::{Error, Result};

pub use in_memory::InMemoryIndex;
pub use memory::PgMemoryIndex;
pub use postgres::{PostgresPool, init_pool, init_pool_for_migrations, migrations};

fn postgres_config(config: &Config) -> Result<&PostgresConfig> {
    config.storage.postgres.as_ref().ok_or_else(|| {
        Error::Config("storage.backend is postgres but DATABASE_URL is not set".into())
    })
}

/// Open the configured index, migrating the Postgres schema when needed
pub async fn open_index(config: &Config) -> Result<Arc<dyn MemoryIndex>> {
    let dimension = config.embedding.dimensions;

    match config.storage.backend {
        StorageBackendType::Memory => {
            info!(dimension, "Using in-memory index");
            Ok(Arc::new(InMemoryIndex::new(dimension)))
        }
        StorageBackendType::Postgres => {
            let pool = init_pool_for_migrations(postgres_config(config)?).await?;
            migrations::run(&pool, dimension).await?;
            info!(dimension, "Using PostgreSQL index");
            Ok(Arc::new(PgMemoryIndex::new(pool, dimension)))
        }
    }
}

/// Open the configured index without touching the schema
///
/// Postgres must already have pgvector and a `memories` table of the
/// configured dimension.
pub async fn connect_index(config: &Config) -> Result<Arc<dyn MemoryIndex>> {
    let dimension = config.embedding.dimensions;

    match config.storage.backend {
        StorageBackendType::Memory => Ok(Arc::new(InMemoryIndex::new(dimension))),
        StorageBackendType::Postgres => {
            let pool = init_pool(postgres_config(config)?).await?;
            migrations::verify_dimension(&pool, dimension).await?;
            Ok(Arc::new(PgMemoryIndex::new(pool, dimension)))
        }
    }
}
