//! PostgreSQL database connection and schema

use crate::config::PostgresConfig;
use crate::error::{Error, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

/// Initialize the PostgreSQL connection pool
pub async fn init_pool(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, true).await
}

/// Initialize the PostgreSQL connection pool without pgvector check
/// Use this for running migrations before pgvector is installed
pub async fn init_pool_for_migrations(config: &PostgresConfig) -> Result<PostgresPool> {
    init_pool_with_options(config, false).await
}

async fn init_pool_with_options(config: &PostgresConfig, require_pgvector: bool) -> Result<PostgresPool> {
    info!("Initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(config.url.expose_secret())
        .await?;

    verify_database(&pool, require_pgvector).await?;

    info!("PostgreSQL connection pool initialized successfully");
    Ok(pool)
}

/// Verify database connection and optionally check for pgvector
async fn verify_database(pool: &PgPool, require_pgvector: bool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;

    if require_pgvector {
        let result: Option<(String,)> =
            sqlx::query_as("SELECT extname FROM pg_extension WHERE extname = 'vector'")
                .fetch_optional(pool)
                .await?;

        if result.is_none() {
            return Err(Error::IndexUnavailable(
                "pgvector extension is not installed. Run: CREATE EXTENSION vector;".into(),
            ));
        }
    }

    Ok(())
}

/// Database migrations
pub mod migrations {
    use super::*;
    use tracing::warn;

    /// Create the memories table for vectors of length `dimension`
    pub async fn run(pool: &PgPool, dimension: usize) -> Result<()> {
        info!("Running database migrations");

        // Try to create pgvector extension (requires superuser or extension already available)
        match sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(pool)
            .await
        {
            Ok(_) => info!("pgvector extension enabled"),
            Err(e) => {
                warn!("Could not create pgvector extension: {}", e);
                warn!("Run as superuser: CREATE EXTENSION vector;");
            }
        }

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS memories (
                id UUID PRIMARY KEY,
                content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
                embedding vector({dimension}) NOT NULL,
                category TEXT,
                entities TEXT[] NOT NULL DEFAULT '{{}}',
                importance TEXT NOT NULL DEFAULT 'medium',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        ))
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_memories_category ON memories(category)")
            .execute(pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_memories_entities ON memories USING GIN(entities)")
            .execute(pool)
            .await?;

        // HNSW works on an empty table, unlike IVFFlat
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memories_embedding ON memories
            USING hnsw (embedding vector_cosine_ops)
            "#,
        )
        .execute(pool)
        .await
        .ok(); // Ignore if the pgvector build predates HNSW

        verify_dimension(pool, dimension).await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Fail if an existing table was created for a different dimension
    pub async fn verify_dimension(pool: &PgPool, dimension: usize) -> Result<()> {
        // For the vector type, atttypmod holds the declared dimension
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT atttypmod FROM pg_attribute
            WHERE attrelid = 'memories'::regclass AND attname = 'embedding'
            "#,
        )
        .fetch_optional(pool)
        .await?;

        match row {
            Some((declared,)) if declared > 0 && declared as usize != dimension => {
                Err(Error::DimensionMismatch {
                    expected: declared as usize,
                    actual: dimension,
                })
            }
            _ => Ok(()),
        }
    }
}
