use sqlx::types::Json;

use super::{PostgresClient, PostgresError};
use crate::models::{
    Collaboration, CollaborationSide, CollaborationStatus, CollaborationWorkspace,
    WorkspaceUpdateRequest,
};

impl PostgresClient {
    /// Requests sent or received by the user, newest first
    pub async fn list_collaborations(&self, user_id: &str) -> Result<Vec<Collaboration>, PostgresError> {
        Ok(sqlx::query_as::<_, Collaboration>(
            r#"
            SELECT * FROM collaborations
            WHERE requester_id = $1 OR receiver_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_collaboration(
        &self,
        requester_id: &str,
        receiver_id: &str,
        message: &str,
    ) -> Result<Collaboration, PostgresError> {
        let collaboration = sqlx::query_as::<_, Collaboration>(
            r#"
            INSERT INTO collaborations (requester_id, receiver_id, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(requester_id)
        .bind(receiver_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            "Collaboration {} requested: {} -> {}",
            collaboration.id,
            requester_id,
            receiver_id
        );
        Ok(collaboration)
    }

    pub async fn get_collaboration(&self, id: i64) -> Result<Option<Collaboration>, PostgresError> {
        Ok(sqlx::query_as::<_, Collaboration>("SELECT * FROM collaborations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Move a pending request to `status`
    ///
    /// Fails with Conflict if the request was no longer pending, including
    /// when another request raced this one.
    pub async fn resolve_collaboration(
        &self,
        id: i64,
        status: CollaborationStatus,
    ) -> Result<Collaboration, PostgresError> {
        sqlx::query_as::<_, Collaboration>(
            r#"
            UPDATE collaborations SET status = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PostgresError::Conflict("Collaboration request is no longer pending".to_string()))
    }

    pub async fn acknowledge_collaboration(
        &self,
        id: i64,
        side: CollaborationSide,
    ) -> Result<Collaboration, PostgresError> {
        let query = match side {
            CollaborationSide::Requester => {
                "UPDATE collaborations SET acknowledged_by_requester = TRUE WHERE id = $1 RETURNING *"
            }
            CollaborationSide::Receiver => {
                "UPDATE collaborations SET acknowledged_by_receiver = TRUE WHERE id = $1 RETURNING *"
            }
        };
        sqlx::query_as::<_, Collaboration>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PostgresError::NotFound("Collaboration not found".to_string()))
    }

    /// Fetch the workspace, creating an empty one on first access
    pub async fn get_or_create_workspace(
        &self,
        collaboration_id: i64,
    ) -> Result<CollaborationWorkspace, PostgresError> {
        sqlx::query(
            r#"
            INSERT INTO collaboration_workspaces (collaboration_id)
            VALUES ($1)
            ON CONFLICT (collaboration_id) DO NOTHING
            "#,
        )
        .bind(collaboration_id)
        .execute(&self.pool)
        .await?;

        Ok(sqlx::query_as::<_, CollaborationWorkspace>(
            "SELECT * FROM collaboration_workspaces WHERE collaboration_id = $1",
        )
        .bind(collaboration_id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Apply a partial update; shoot dates must already be sorted
    pub async fn update_workspace(
        &self,
        collaboration_id: i64,
        update: &WorkspaceUpdateRequest,
    ) -> Result<CollaborationWorkspace, PostgresError> {
        self.get_or_create_workspace(collaboration_id).await?;

        let workspace = sqlx::query_as::<_, CollaborationWorkspace>(
            r#"
            UPDATE collaboration_workspaces SET
                concept = COALESCE($2, concept),
                shoot_dates = COALESCE($3, shoot_dates),
                location = COALESCE($4, location),
                location_details = COALESCE($5, location_details),
                roles = COALESCE($6, roles),
                revenue_split = COALESCE($7, revenue_split),
                consent_checklist_completed = COALESCE($8, consent_checklist_completed),
                testing_discussion_confirmed = COALESCE($9, testing_discussion_confirmed),
                testing_discussion_notes = COALESCE($10, testing_discussion_notes),
                notes = COALESCE($11, notes),
                attachments = COALESCE($12, attachments),
                updated_at = NOW()
            WHERE collaboration_id = $1
            RETURNING *
            "#,
        )
        .bind(collaboration_id)
        .bind(&update.concept)
        .bind(update.shoot_dates.as_ref().map(Json))
        .bind(&update.location)
        .bind(&update.location_details)
        .bind(update.roles.as_ref().map(Json))
        .bind(update.revenue_split.as_ref().map(Json))
        .bind(update.consent_checklist_completed)
        .bind(update.testing_discussion_confirmed)
        .bind(&update.testing_discussion_notes)
        .bind(&update.notes)
        .bind(update.attachments.as_ref().map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(workspace)
    }

    /// Record that one side acknowledged the other's boundaries
    pub async fn acknowledge_boundaries(
        &self,
        collaboration_id: i64,
        side: CollaborationSide,
    ) -> Result<CollaborationWorkspace, PostgresError> {
        self.get_or_create_workspace(collaboration_id).await?;

        let query = match side {
            CollaborationSide::Requester => {
                r#"UPDATE collaboration_workspaces
                   SET requester_boundaries_acknowledged = TRUE, updated_at = NOW()
                   WHERE collaboration_id = $1 RETURNING *"#
            }
            CollaborationSide::Receiver => {
                r#"UPDATE collaboration_workspaces
                   SET receiver_boundaries_acknowledged = TRUE, updated_at = NOW()
                   WHERE collaboration_id = $1 RETURNING *"#
            }
        };

        Ok(sqlx::query_as::<_, CollaborationWorkspace>(query)
            .bind(collaboration_id)
            .fetch_one(&self.pool)
            .await?)
    }
}
