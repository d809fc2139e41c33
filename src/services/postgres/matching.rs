use std::collections::HashMap;

use super::{on_unique, PostgresClient, PostgresError};
use crate::models::{Like, Match, Message, SeenEventType};

const UPSERT_SEEN: &str = r#"
    INSERT INTO seen_profiles (user_id, target_user_id, event_type, seen_at)
    VALUES ($1, $2, $3, NOW())
    ON CONFLICT (user_id, target_user_id)
    DO UPDATE SET
        event_type = EXCLUDED.event_type,
        seen_at = EXCLUDED.seen_at
"#;

impl PostgresClient {
    /// Record that a user has seen a profile
    ///
    /// If the record already exists, the event type and timestamp are updated.
    pub async fn record_seen(
        &self,
        user_id: &str,
        target_user_id: &str,
        event_type: SeenEventType,
    ) -> Result<(), PostgresError> {
        sqlx::query(UPSERT_SEEN)
            .bind(user_id)
            .bind(target_user_id)
            .bind(event_type)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded seen profile: {} -> {} ({:?})",
            user_id,
            target_user_id,
            event_type
        );
        Ok(())
    }

    /// True if either user has blocked the other
    pub async fn is_blocked_either_way(&self, a: &str, b: &str) -> Result<bool, PostgresError> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM blocks
                WHERE (blocker_id = $1 AND blocked_id = $2)
                   OR (blocker_id = $2 AND blocked_id = $1)
            )
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    /// Store a like; if it is reciprocated, create the match in the same transaction
    ///
    /// Both users are marked `matched` in each other's seen list when a match forms.
    pub async fn like_user(
        &self,
        liker_id: &str,
        liked_id: &str,
        is_super_like: bool,
    ) -> Result<(Like, Option<Match>), PostgresError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (liker_id, liked_id, is_super_like)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(liker_id)
        .bind(liked_id)
        .bind(is_super_like)
        .fetch_one(&mut *tx)
        .await;
        let like = on_unique(inserted, || {
            PostgresError::InvalidInput("Already liked this user".to_string())
        })?;

        sqlx::query(UPSERT_SEEN)
            .bind(liker_id)
            .bind(liked_id)
            .bind(SeenEventType::Liked)
            .execute(&mut *tx)
            .await?;

        let (mutual,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM likes WHERE liker_id = $1 AND liked_id = $2)")
                .bind(liked_id)
                .bind(liker_id)
                .fetch_one(&mut *tx)
                .await?;

        let matched = if mutual {
            let matched = sqlx::query_as::<_, Match>(
                "INSERT INTO matches (user1_id, user2_id) VALUES ($1, $2) RETURNING *",
            )
            .bind(liked_id)
            .bind(liker_id)
            .fetch_one(&mut *tx)
            .await?;

            for (user, target) in [(liker_id, liked_id), (liked_id, liker_id)] {
                sqlx::query(UPSERT_SEEN)
                    .bind(user)
                    .bind(target)
                    .bind(SeenEventType::Matched)
                    .execute(&mut *tx)
                    .await?;
            }

            tracing::info!("Match {} created between {} and {}", matched.id, liked_id, liker_id);
            Some(matched)
        } else {
            None
        };

        tx.commit().await?;
        Ok((like, matched))
    }

    pub async fn likes_received(&self, user_id: &str) -> Result<Vec<Like>, PostgresError> {
        Ok(sqlx::query_as::<_, Like>(
            "SELECT * FROM likes WHERE liked_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Active matches of a user, newest first
    pub async fn list_matches(&self, user_id: &str) -> Result<Vec<Match>, PostgresError> {
        Ok(sqlx::query_as::<_, Match>(
            r#"
            SELECT * FROM matches
            WHERE (user1_id = $1 OR user2_id = $1) AND is_active = TRUE
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_match(&self, match_id: i64) -> Result<Option<Match>, PostgresError> {
        Ok(sqlx::query_as::<_, Match>("SELECT * FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Unmatch; the row is kept with `is_active = false`
    pub async fn deactivate_match(&self, match_id: i64) -> Result<(), PostgresError> {
        sqlx::query("UPDATE matches SET is_active = FALSE WHERE id = $1")
            .bind(match_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent message per match
    pub async fn last_messages(&self, match_ids: &[i64]) -> Result<HashMap<i64, Message>, PostgresError> {
        if match_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, Message>(
            r#"
            SELECT DISTINCT ON (match_id) *
            FROM messages
            WHERE match_id = ANY($1)
            ORDER BY match_id, created_at DESC, id DESC
            "#,
        )
        .bind(match_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|m| (m.match_id, m)).collect())
    }

    pub async fn create_message(
        &self,
        match_id: i64,
        sender_id: &str,
        content: &str,
        message_type: &str,
        media_url: Option<&str>,
    ) -> Result<Message, PostgresError> {
        Ok(sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (match_id, sender_id, content, message_type, media_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(match_id)
        .bind(sender_id)
        .bind(content)
        .bind(message_type)
        .bind(media_url)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Messages of a match, oldest first
    pub async fn list_messages(&self, match_id: i64) -> Result<Vec<Message>, PostgresError> {
        Ok(sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE match_id = $1 ORDER BY created_at ASC, id ASC",
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Mark the other participant's messages as read
    pub async fn mark_messages_read(&self, match_id: i64, reader_id: &str) -> Result<u64, PostgresError> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = TRUE WHERE match_id = $1 AND sender_id <> $2 AND is_read = FALSE",
        )
        .bind(match_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
