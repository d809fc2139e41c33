//! PostgreSQL storage
//!
//! `PostgresClient` owns the pool; query methods are grouped per domain in
//! the submodules as additional `impl PostgresClient` blocks.

mod collaborations;
mod community;
mod connections;
mod events;
mod matching;
mod moderation;
mod profiles;
mod safety;
mod statistics;
mod support;
mod users;
mod vault;

pub use community::{PostWithCounts, TopicWithPostCount, GENERAL_FEED_TOPIC, RESTORE_WINDOW_DAYS};
pub use events::EventWithCount;
pub use users::new_session_id;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::config::DatabaseSettings;
use crate::models::UserSummary;

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),
}

impl PostgresError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            PostgresError::SqlxError(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}

/// Turn a unique violation into a domain error, pass anything else through
pub(crate) fn on_unique<T>(
    result: Result<T, sqlx::Error>,
    err: impl FnOnce() -> PostgresError,
) -> Result<T, PostgresError> {
    result.map_err(|e| {
        let e = PostgresError::from(e);
        if e.is_unique_violation() {
            err()
        } else {
            e
        }
    })
}

/// PostgreSQL client shared by all handlers
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(settings: &DatabaseSettings) -> Result<Self, PostgresError> {
        Self::new(
            &settings.url,
            settings.max_connections.unwrap_or(10),
            settings.min_connections.unwrap_or(1),
            Duration::from_secs(settings.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool, PostgresError> {
        let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }

    /// Batch-load public user fields for the given ids
    pub async fn user_summaries(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, UserSummary>, PostgresError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut unique: Vec<&str> = ids.iter().map(String::as_str).collect();
        unique.sort_unstable();
        unique.dedup();

        let rows: Vec<UserSummary> = sqlx::query_as(
            r#"
            SELECT id, first_name, last_name, display_name, profile_image_url
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(&unique)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|u| (u.id.clone(), u)).collect())
    }
}
