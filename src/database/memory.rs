//! Memory index backed by PostgreSQL + pgvector

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::core::storage::{check_dimension, check_top_k};
use crate::core::{
    Condition, FilterField, FilterOp, IndexEntry, IndexMatch, IndexStats, MemoryIndex,
    MemoryMetadata, MetadataFilter,
};
use crate::database::PostgresPool;
use crate::error::{Error, Result};

/// `MemoryIndex` over the `memories` table
#[derive(Clone)]
pub struct PgMemoryIndex {
    pool: PostgresPool,
    dimension: usize,
}

impl PgMemoryIndex {
    /// Create an index over an already migrated pool
    pub fn new(pool: PostgresPool, dimension: usize) -> Self {
        PgMemoryIndex { pool, dimension }
    }
}

#[derive(FromRow)]
struct MemoryRow {
    id: Uuid,
    content: String,
    category: Option<String>,
    entities: Vec<String>,
    importance: String,
    created_at: DateTime<Utc>,
    score: f64,
}

impl TryFrom<MemoryRow> for IndexMatch {
    type Error = Error;

    fn try_from(row: MemoryRow) -> Result<Self> {
        let importance = row.importance.parse().map_err(|_| {
            Error::Internal(format!(
                "Unknown importance {:?} in memory {}",
                row.importance, row.id
            ))
        })?;

        Ok(IndexMatch {
            id: row.id,
            score: row.score as f32,
            metadata: MemoryMetadata {
                text: row.content,
                category: row.category,
                entities: row.entities,
                importance,
                created_at: row.created_at,
            },
        })
    }
}

/// Build the nearest-neighbour query for `vector`, filtered before the limit
fn build_query(
    vector: &[f32],
    top_k: usize,
    filter: Option<&MetadataFilter>,
) -> QueryBuilder<'static, Postgres> {
    let embedding = Vector::from(vector.to_vec());

    let mut builder = QueryBuilder::new(
        "SELECT id, content, category, entities, importance, created_at, \
         1 - (embedding <=> ",
    );
    builder.push_bind(embedding.clone());
    builder.push(") AS score FROM memories WHERE TRUE");

    if let Some(filter) = filter {
        for condition in filter.conditions() {
            builder.push(" AND ");
            push_condition(&mut builder, condition);
        }
    }

    builder.push(" ORDER BY embedding <=> ");
    builder.push_bind(embedding);
    builder.push(", created_at DESC, id LIMIT ");
    builder.push_bind(top_k as i64);
    builder
}

fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, condition: &Condition) {
    let column = match condition.field {
        FilterField::Category => "category",
        FilterField::Importance => "importance",
        FilterField::DateCreated => "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
        FilterField::Entities => {
            push_entities_condition(builder, condition);
            return;
        }
    };

    match condition.op {
        FilterOp::Eq => {
            builder.push(column).push(" = ");
            builder.push_bind(condition.value.clone());
        }
        FilterOp::Ne => {
            // NULL counts as not equal
            builder.push(column).push(" IS DISTINCT FROM ");
            builder.push_bind(condition.value.clone());
        }
        FilterOp::Contains => {
            builder.push("strpos(lower(").push(column).push("), lower(");
            builder.push_bind(condition.value.clone());
            builder.push(")) > 0");
        }
    }
}

fn push_entities_condition(builder: &mut QueryBuilder<'static, Postgres>, condition: &Condition) {
    match condition.op {
        FilterOp::Eq => {
            builder.push("EXISTS (SELECT 1 FROM unnest(entities) AS e WHERE e = ");
            builder.push_bind(condition.value.clone());
        }
        FilterOp::Ne => {
            builder.push("NOT EXISTS (SELECT 1 FROM unnest(entities) AS e WHERE e = ");
            builder.push_bind(condition.value.clone());
        }
        FilterOp::Contains => {
            builder.push(
                "EXISTS (SELECT 1 FROM unnest(entities) AS e WHERE strpos(lower(e), lower(",
            );
            builder.push_bind(condition.value.clone());
            builder.push(")) > 0");
        }
    }
    builder.push(")");
}

#[async_trait]
impl MemoryIndex for PgMemoryIndex {
    fn id(&self) -> &str {
        "postgres"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, entry: IndexEntry) -> Result<()> {
        check_dimension(self.dimension, &entry.vector)?;

        debug!(id = %entry.id, "Upserting memory");
        let metadata = entry.metadata;
        sqlx::query(
            r#"
            INSERT INTO memories (id, content, embedding, category, entities, importance, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding,
                category = EXCLUDED.category,
                entities = EXCLUDED.entities,
                importance = EXCLUDED.importance,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(entry.id)
        .bind(&metadata.text)
        .bind(Vector::from(entry.vector))
        .bind(&metadata.category)
        .bind(&metadata.entities)
        .bind(metadata.importance.as_str())
        .bind(metadata.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<IndexMatch>> {
        check_top_k(top_k)?;
        check_dimension(self.dimension, vector)?;

        let mut builder = build_query(vector, top_k, filter);
        let rows: Vec<MemoryRow> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(IndexMatch::try_from).collect()
    }

    async fn describe(&self) -> Result<IndexStats> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM memories")
            .fetch_one(&self.pool)
            .await?;

        Ok(IndexStats {
            total_records: count.max(0) as u64,
            dimension: self.dimension,
        })
    }
}
