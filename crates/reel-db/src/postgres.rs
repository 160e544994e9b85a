//! Postgres-backed video store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use tracing::{debug, info};

use reel_models::{VideoId, VideoRecord};

use crate::error::{DbError, DbResult};
use crate::store::VideoStore;

/// Row shape of the `videos` table.
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: String,
    owner: String,
    name: String,
    status: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VideoRow> for VideoRecord {
    fn from(row: VideoRow) -> Self {
        VideoRecord {
            id: VideoId::from_string(row.id),
            owner: row.owner,
            name: row.name,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Video store backed by Postgres.
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `DATABASE_URL`.
    pub async fn from_env() -> DbResult<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DbError::config_error("DATABASE_URL not set"))?;
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Create the `videos` table if it does not exist.
    pub async fn ensure_schema(&self) -> DbResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS videos (
                id          TEXT PRIMARY KEY,
                owner       TEXT NOT NULL,
                name        TEXT NOT NULL,
                status      INTEGER NOT NULL DEFAULT 0 CHECK (status >= 0),
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
                UNIQUE (owner, name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Videos schema ready");
        Ok(())
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn upsert(&self, owner: &str, name: &str) -> DbResult<VideoRecord> {
        let id = VideoId::derive(owner, name);

        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            INSERT INTO videos (id, owner, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET updated_at = now()
            RETURNING id, owner, name, status, created_at, updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        debug!(video = %id, status = row.status, "Upserted video record");
        Ok(row.into())
    }

    async fn get(&self, id: &VideoId) -> DbResult<Option<VideoRecord>> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            SELECT id, owner, name, status, created_at, updated_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn increment_and_get(&self, id: &VideoId) -> DbResult<i32> {
        // Single-statement increment-and-return; the row lock taken by
        // UPDATE serializes concurrent reports so each caller sees a
        // distinct new value.
        let status: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE videos
            SET status = status + 1, updated_at = now()
            WHERE id = $1
            RETURNING status
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        status.ok_or_else(|| DbError::not_found(id.as_str()))
    }
}
