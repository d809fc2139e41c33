use chrono::{DateTime, Utc};
use sqlx::types::Json;

use super::{on_unique, PostgresClient, PostgresError};
use crate::models::{Collaboration, Follow, MutedUser, RestrictedUser, Restrictions};

impl PostgresClient {
    pub async fn followers(&self, user_id: &str) -> Result<Vec<Follow>, PostgresError> {
        Ok(sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE following_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn following(&self, user_id: &str) -> Result<Vec<Follow>, PostgresError> {
        Ok(sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn follow(&self, follower_id: &str, following_id: &str) -> Result<Follow, PostgresError> {
        let result = sqlx::query_as::<_, Follow>(
            "INSERT INTO follows (follower_id, following_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await;
        on_unique(result, || PostgresError::Conflict("Already following this user".to_string()))
    }

    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn muted_users(&self, user_id: &str) -> Result<Vec<MutedUser>, PostgresError> {
        Ok(sqlx::query_as::<_, MutedUser>(
            "SELECT * FROM muted_users WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn mute(&self, user_id: &str, muted_user_id: &str) -> Result<MutedUser, PostgresError> {
        let result = sqlx::query_as::<_, MutedUser>(
            "INSERT INTO muted_users (user_id, muted_user_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(muted_user_id)
        .fetch_one(&self.pool)
        .await;
        on_unique(result, || PostgresError::Conflict("User already muted".to_string()))
    }

    pub async fn unmute(&self, user_id: &str, muted_user_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM muted_users WHERE user_id = $1 AND muted_user_id = $2")
            .bind(user_id)
            .bind(muted_user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn restricted_users(&self, user_id: &str) -> Result<Vec<RestrictedUser>, PostgresError> {
        Ok(sqlx::query_as::<_, RestrictedUser>(
            "SELECT * FROM restricted_users WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn restrict(
        &self,
        user_id: &str,
        restricted_user_id: &str,
        restrictions: &Restrictions,
    ) -> Result<RestrictedUser, PostgresError> {
        Ok(sqlx::query_as::<_, RestrictedUser>(
            r#"
            INSERT INTO restricted_users (user_id, restricted_user_id, restrictions)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, restricted_user_id)
            DO UPDATE SET restrictions = EXCLUDED.restrictions, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(restricted_user_id)
        .bind(Json(restrictions))
        .fetch_one(&self.pool)
        .await?)
    }

    pub async fn unrestrict(&self, user_id: &str, restricted_user_id: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query(
            "DELETE FROM restricted_users WHERE user_id = $1 AND restricted_user_id = $2",
        )
        .bind(user_id)
        .bind(restricted_user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Restrictions `owner_id` has placed on `target_id`; all off when none
    pub async fn restrictions_on(&self, owner_id: &str, target_id: &str) -> Result<Restrictions, PostgresError> {
        let row = sqlx::query_as::<_, RestrictedUser>(
            "SELECT * FROM restricted_users WHERE user_id = $1 AND restricted_user_id = $2",
        )
        .bind(owner_id)
        .bind(target_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.flags()).unwrap_or_default())
    }

    /// Follows made by the user since `since`
    pub async fn follows_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Vec<Follow>, PostgresError> {
        Ok(sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 AND created_at >= $2 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Collaborations involving the user since `since`
    pub async fn collaborations_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Collaboration>, PostgresError> {
        Ok(sqlx::query_as::<_, Collaboration>(
            r#"
            SELECT * FROM collaborations
            WHERE (requester_id = $1 OR receiver_id = $1) AND created_at >= $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?)
    }
}
