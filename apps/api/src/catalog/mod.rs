//! Meme catalog: read access for the caption pipeline, column updates for enrichment.
//!
//! `AppState` holds an `Arc<dyn MemeCatalog>`; production uses `PgMemeCatalog`.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::meme::{MemeRow, MemeTemplate};

pub mod handlers;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Meme {0} not found")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Column written back by the enrichment job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichedColumn {
    Description,
    Schema,
    Rules,
}

impl EnrichedColumn {
    fn column(self) -> &'static str {
        match self {
            EnrichedColumn::Description => "description",
            EnrichedColumn::Schema => "schema",
            EnrichedColumn::Rules => "rules",
        }
    }
}

#[async_trait]
pub trait MemeCatalog: Send + Sync {
    async fn list(&self) -> Result<Vec<MemeTemplate>, CatalogError>;

    async fn get(&self, id: Uuid) -> Result<MemeTemplate, CatalogError>;

    async fn update(
        &self,
        id: Uuid,
        column: EnrichedColumn,
        value: &str,
    ) -> Result<(), CatalogError>;
}

/// Postgres-backed catalog over the `memes` table.
#[derive(Clone)]
pub struct PgMemeCatalog {
    pool: PgPool,
}

impl PgMemeCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemeCatalog for PgMemeCatalog {
    async fn list(&self) -> Result<Vec<MemeTemplate>, CatalogError> {
        let rows = sqlx::query_as::<_, MemeRow>(
            r#"
            SELECT id, name, url, description, schema, rules, captions, created_at
            FROM memes
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!("Loaded {} memes from catalog", rows.len());
        Ok(rows.into_iter().map(MemeTemplate::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<MemeTemplate, CatalogError> {
        sqlx::query_as::<_, MemeRow>(
            r#"
            SELECT id, name, url, description, schema, rules, captions, created_at
            FROM memes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(MemeTemplate::from)
        .ok_or(CatalogError::NotFound(id))
    }

    async fn update(
        &self,
        id: Uuid,
        column: EnrichedColumn,
        value: &str,
    ) -> Result<(), CatalogError> {
        // Column names come from a closed enum, never from input.
        let sql = format!("UPDATE memes SET {} = $1 WHERE id = $2", column.column());
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(id));
        }
        Ok(())
    }
}
