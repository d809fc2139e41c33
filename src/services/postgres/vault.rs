use super::{PostgresClient, PostgresError};
use crate::models::{ArchivedItem, DeletedPost, DraftPost, ForumPost};

impl PostgresClient {
    pub async fn list_drafts(&self, user_id: &str) -> Result<Vec<DraftPost>, PostgresError> {
        Ok(sqlx::query_as::<_, DraftPost>(
            "SELECT * FROM draft_posts WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn save_draft(
        &self,
        user_id: &str,
        topic_id: Option<i64>,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<DraftPost, PostgresError> {
        Ok(sqlx::query_as::<_, DraftPost>(
            r#"
            INSERT INTO draft_posts (user_id, topic_id, title, content)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(topic_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn delete_draft(&self, user_id: &str, draft_id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM draft_posts WHERE id = $1 AND user_id = $2")
            .bind(draft_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_archived(&self, user_id: &str) -> Result<Vec<ArchivedItem>, PostgresError> {
        Ok(sqlx::query_as::<_, ArchivedItem>(
            "SELECT * FROM archived_items WHERE user_id = $1 ORDER BY archived_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Snapshot one of the user's posts into the archive
    pub async fn archive_post(&self, user_id: &str, post: &ForumPost) -> Result<ArchivedItem, PostgresError> {
        Ok(sqlx::query_as::<_, ArchivedItem>(
            r#"
            INSERT INTO archived_items (user_id, item_type, item_id, title, content)
            VALUES ($1, 'post', $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn unarchive(&self, user_id: &str, item_id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM archived_items WHERE id = $1 AND user_id = $2")
            .bind(item_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deleted posts that have not been purged, newest first
    pub async fn list_deleted_posts(&self, user_id: &str) -> Result<Vec<DeletedPost>, PostgresError> {
        Ok(sqlx::query_as::<_, DeletedPost>(
            r#"
            SELECT * FROM deleted_posts
            WHERE user_id = $1 AND permanently_deleted = FALSE
            ORDER BY deleted_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_deleted_post(&self, user_id: &str, id: i64) -> Result<Option<DeletedPost>, PostgresError> {
        Ok(sqlx::query_as::<_, DeletedPost>(
            "SELECT * FROM deleted_posts WHERE id = $1 AND user_id = $2 AND permanently_deleted = FALSE",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Undelete the original post and drop the vault entry
    pub async fn restore_deleted_post(&self, deleted: &DeletedPost) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        if let Some(post_id) = deleted.original_post_id {
            sqlx::query("UPDATE forum_posts SET deleted_at = NULL, updated_at = NOW() WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("DELETE FROM deleted_posts WHERE id = $1")
            .bind(deleted.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove the original post for good and mark the vault entry purged
    pub async fn purge_deleted_post(&self, deleted: &DeletedPost) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE deleted_posts SET permanently_deleted = TRUE WHERE id = $1")
            .bind(deleted.id)
            .execute(&mut *tx)
            .await?;

        if let Some(post_id) = deleted.original_post_id {
            sqlx::query("DELETE FROM forum_posts WHERE id = $1 AND deleted_at IS NOT NULL")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
