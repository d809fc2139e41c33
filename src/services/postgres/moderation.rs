use super::{on_unique, PostgresClient, PostgresError};
use crate::models::{Block, Report};

impl PostgresClient {
    pub async fn list_blocks(&self, blocker_id: &str) -> Result<Vec<Block>, PostgresError> {
        Ok(sqlx::query_as::<_, Block>(
            "SELECT * FROM blocks WHERE blocker_id = $1 ORDER BY created_at DESC",
        )
        .bind(blocker_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_block(&self, blocker_id: &str, blocked_id: &str) -> Result<Block, PostgresError> {
        let result = sqlx::query_as::<_, Block>(
            "INSERT INTO blocks (blocker_id, blocked_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(blocker_id)
        .bind(blocked_id)
        .fetch_one(&self.pool)
        .await;

        let block = on_unique(result, || PostgresError::Conflict("User already blocked".to_string()))?;
        tracing::info!("User {} blocked {}", blocker_id, blocked_id);
        Ok(block)
    }

    /// Delete a block owned by `blocker_id`; false if there was none
    pub async fn delete_block(&self, block_id: i64, blocker_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = $1 AND blocker_id = $2")
            .bind(block_id)
            .bind(blocker_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn create_report(
        &self,
        reporter_id: &str,
        reported_id: &str,
        reason: &str,
        description: Option<&str>,
    ) -> Result<Report, PostgresError> {
        let report = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (reporter_id, reported_id, reason, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(reporter_id)
        .bind(reported_id)
        .bind(reason)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Report {} filed against {}", report.id, reported_id);
        Ok(report)
    }
}
