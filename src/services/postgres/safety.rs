use super::{PostgresClient, PostgresError};
use crate::models::{AlertType, CreateSafetyAlertRequest, SafetyAlert};

impl PostgresClient {
    /// Alerts newest first, optionally of one type
    pub async fn list_safety_alerts(&self, alert_type: Option<AlertType>) -> Result<Vec<SafetyAlert>, PostgresError> {
        Ok(sqlx::query_as::<_, SafetyAlert>(
            r#"
            SELECT * FROM safety_alerts
            WHERE ($1::alert_type IS NULL OR alert_type = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(alert_type)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_safety_alert(
        &self,
        reporter_id: &str,
        req: &CreateSafetyAlertRequest,
    ) -> Result<SafetyAlert, PostgresError> {
        let alert = sqlx::query_as::<_, SafetyAlert>(
            r#"
            INSERT INTO safety_alerts (reporter_id, alert_type, title, description,
                                       evidence_urls, suspect_name, suspect_handle)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(reporter_id)
        .bind(req.alert_type)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.evidence_urls)
        .bind(&req.suspect_name)
        .bind(&req.suspect_handle)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Safety alert {} ({:?}) filed by {}", alert.id, alert.alert_type, reporter_id);
        Ok(alert)
    }

    pub async fn get_safety_alert(&self, id: i64) -> Result<Option<SafetyAlert>, PostgresError> {
        Ok(sqlx::query_as::<_, SafetyAlert>("SELECT * FROM safety_alerts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn resolve_safety_alert(&self, id: i64) -> Result<SafetyAlert, PostgresError> {
        sqlx::query_as::<_, SafetyAlert>(
            "UPDATE safety_alerts SET is_resolved = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PostgresError::NotFound("Safety alert not found".to_string()))
    }
}
