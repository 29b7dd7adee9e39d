//! Durable experiment storage keyed by subject.

use super::types::{Experiment, ExperimentStatus, Variant};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// Persistence seam for experiments. The tracker serializes per-subject
/// access; implementations only need read-modify-write with the subject as
/// the key.
#[async_trait]
pub trait ExperimentStore: Send + Sync {
    /// Insert a new experiment. Fails if the subject already has one.
    async fn insert(&self, experiment: &Experiment) -> Result<(), StoreError>;

    async fn load(&self, subject: &str) -> Result<Option<Experiment>, StoreError>;

    /// Persist updated counters / status for an existing experiment.
    async fn save(&self, experiment: &Experiment) -> Result<(), StoreError>;
}

/// SQLite-backed experiment store.
pub struct SqliteExperimentStore {
    pool: SqlitePool,
}

impl SqliteExperimentStore {
    /// Open (or create) the database at the given path.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Open(e.to_string()))?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;

        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Open an in-memory database (useful for tests). Pinned to a single
    /// connection: every pooled connection to `:memory:` would otherwise see
    /// its own empty database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Open(e.to_string()))?;
        init_schema(&pool).await?;
        Ok(Self { pool })
    }
}

async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::raw_sql(
        "CREATE TABLE IF NOT EXISTS experiments (
            subject      TEXT PRIMARY KEY,
            control_id   TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'running',
            winner_id    TEXT,
            confidence   REAL,
            created_at   TEXT NOT NULL,
            completed_at TEXT
        );
        CREATE TABLE IF NOT EXISTS variants (
            subject     TEXT NOT NULL REFERENCES experiments(subject) ON DELETE CASCADE,
            variant_id  TEXT NOT NULL,
            position    INTEGER NOT NULL,
            content     TEXT NOT NULL,
            impressions INTEGER NOT NULL DEFAULT 0,
            clicks      INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (subject, variant_id)
        );
        CREATE INDEX IF NOT EXISTS idx_variants_subject ON variants(subject);",
    )
    .execute(pool)
    .await?;
    Ok(())
}

fn count_to_db(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn count_from_db(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw}: {e}")))
}

#[async_trait]
impl ExperimentStore for SqliteExperimentStore {
    async fn insert(&self, experiment: &Experiment) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO experiments
                (subject, control_id, status, winner_id, confidence, created_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&experiment.subject)
        .bind(&experiment.control_id)
        .bind(experiment.status.to_string())
        .bind(experiment.winner_id.as_deref())
        .bind(experiment.confidence)
        .bind(experiment.created_at.to_rfc3339())
        .bind(experiment.completed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        for (position, variant) in experiment.variants.iter().enumerate() {
            sqlx::query(
                "INSERT INTO variants
                    (subject, variant_id, position, content, impressions, clicks)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&experiment.subject)
            .bind(&variant.id)
            .bind(i64::try_from(position).unwrap_or(i64::MAX))
            .bind(&variant.content)
            .bind(count_to_db(variant.impressions))
            .bind(count_to_db(variant.clicks))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load(&self, subject: &str) -> Result<Option<Experiment>, StoreError> {
        let Some(row) = sqlx::query(
            "SELECT control_id, status, winner_id, confidence, created_at, completed_at
             FROM experiments WHERE subject = ?1",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let status: ExperimentStatus = row
            .get::<String, _>("status")
            .parse()
            .map_err(StoreError::Corrupt)?;
        let created_at = parse_timestamp(&row.get::<String, _>("created_at"))?;
        let completed_at = row
            .get::<Option<String>, _>("completed_at")
            .map(|raw| parse_timestamp(&raw))
            .transpose()?;

        let variant_rows = sqlx::query(
            "SELECT variant_id, content, impressions, clicks
             FROM variants WHERE subject = ?1 ORDER BY position",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;

        let variants = variant_rows
            .into_iter()
            .map(|row| Variant {
                id: row.get("variant_id"),
                content: row.get("content"),
                impressions: count_from_db(row.get("impressions")),
                clicks: count_from_db(row.get("clicks")),
            })
            .collect();

        Ok(Some(Experiment {
            subject: subject.to_string(),
            control_id: row.get("control_id"),
            variants,
            status,
            winner_id: row.get("winner_id"),
            confidence: row.get("confidence"),
            created_at,
            completed_at,
        }))
    }

    async fn save(&self, experiment: &Experiment) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE experiments
             SET status = ?2, winner_id = ?3, confidence = ?4, completed_at = ?5
             WHERE subject = ?1",
        )
        .bind(&experiment.subject)
        .bind(experiment.status.to_string())
        .bind(experiment.winner_id.as_deref())
        .bind(experiment.confidence)
        .bind(experiment.completed_at.map(|t| t.to_rfc3339()))
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Query(format!(
                "no experiment row for subject {}",
                experiment.subject
            )));
        }

        for variant in &experiment.variants {
            sqlx::query(
                "UPDATE variants SET impressions = ?3, clicks = ?4
                 WHERE subject = ?1 AND variant_id = ?2",
            )
            .bind(&experiment.subject)
            .bind(&variant.id)
            .bind(count_to_db(variant.impressions))
            .bind(count_to_db(variant.clicks))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
