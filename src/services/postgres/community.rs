use std::collections::HashSet;

use super::{on_unique, PostgresClient, PostgresError};
use crate::models::{ForumPost, ForumTopic, PostReply};

/// Topic that feed posts land in
pub const GENERAL_FEED_TOPIC: &str = "General Feed";

/// Deleted posts stay restorable this long
pub const RESTORE_WINDOW_DAYS: i32 = 30;

/// A post row with its reply count
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithCounts {
    #[sqlx(flatten)]
    pub post: ForumPost,
    pub replies_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TopicWithPostCount {
    #[sqlx(flatten)]
    pub topic: ForumTopic,
    pub post_count: i64,
}

const POST_WITH_COUNTS: &str = r#"
    SELECT p.*,
        (SELECT COUNT(*) FROM post_replies r WHERE r.post_id = p.id) AS replies_count
    FROM forum_posts p
"#;

impl PostgresClient {
    pub async fn get_or_create_topic(
        &self,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<ForumTopic, PostgresError> {
        sqlx::query(
            "INSERT INTO forum_topics (name, description, icon) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(description)
        .bind(icon)
        .execute(&self.pool)
        .await?;

        Ok(sqlx::query_as::<_, ForumTopic>("SELECT * FROM forum_topics WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn general_feed_topic(&self) -> Result<ForumTopic, PostgresError> {
        self.get_or_create_topic(GENERAL_FEED_TOPIC, "Posts from the community feed", "message-square")
            .await
    }

    pub async fn create_topic(
        &self,
        name: &str,
        description: &str,
        icon: &str,
    ) -> Result<ForumTopic, PostgresError> {
        let result = sqlx::query_as::<_, ForumTopic>(
            "INSERT INTO forum_topics (name, description, icon) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .bind(icon)
        .fetch_one(&self.pool)
        .await;

        on_unique(result, || PostgresError::InvalidInput("Topic already exists".to_string()))
    }

    pub async fn get_topic(&self, topic_id: i64) -> Result<Option<ForumTopic>, PostgresError> {
        Ok(sqlx::query_as::<_, ForumTopic>("SELECT * FROM forum_topics WHERE id = $1")
            .bind(topic_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn topics_by_ids(&self, ids: &[i64]) -> Result<Vec<ForumTopic>, PostgresError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, ForumTopic>("SELECT * FROM forum_topics WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Topics with their number of live posts
    pub async fn list_topics(&self) -> Result<Vec<TopicWithPostCount>, PostgresError> {
        Ok(sqlx::query_as::<_, TopicWithPostCount>(
            r#"
            SELECT t.*,
                (SELECT COUNT(*) FROM forum_posts p WHERE p.topic_id = t.id AND p.deleted_at IS NULL) AS post_count
            FROM forum_topics t
            ORDER BY t.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Newest live posts across all topics
    pub async fn feed_posts(&self, limit: i64, offset: i64) -> Result<Vec<PostWithCounts>, PostgresError> {
        let query = format!(
            "{} WHERE p.deleted_at IS NULL ORDER BY p.is_pinned DESC, p.created_at DESC LIMIT $1 OFFSET $2",
            POST_WITH_COUNTS
        );
        Ok(sqlx::query_as::<_, PostWithCounts>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn topic_posts(
        &self,
        topic_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostWithCounts>, PostgresError> {
        let query = format!(
            r#"{} WHERE p.topic_id = $1 AND p.deleted_at IS NULL
               ORDER BY p.is_pinned DESC, p.created_at DESC LIMIT $2 OFFSET $3"#,
            POST_WITH_COUNTS
        );
        Ok(sqlx::query_as::<_, PostWithCounts>(&query)
            .bind(topic_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Non-anonymous live posts by one author
    pub async fn user_posts(&self, author_id: &str) -> Result<Vec<PostWithCounts>, PostgresError> {
        let query = format!(
            r#"{} WHERE p.author_id = $1 AND p.is_anonymous = FALSE AND p.deleted_at IS NULL
               ORDER BY p.created_at DESC"#,
            POST_WITH_COUNTS
        );
        Ok(sqlx::query_as::<_, PostWithCounts>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Live posts the user is tagged in
    pub async fn tagged_posts(&self, user_id: &str) -> Result<Vec<PostWithCounts>, PostgresError> {
        let query = format!(
            r#"{} JOIN post_tags pt ON pt.post_id = p.id
               WHERE pt.tagged_user_id = $1 AND p.deleted_at IS NULL
               ORDER BY p.created_at DESC"#,
            POST_WITH_COUNTS
        );
        Ok(sqlx::query_as::<_, PostWithCounts>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Create a post; anonymous posts are stored without an author
    pub async fn create_post(
        &self,
        topic_id: i64,
        author_id: &str,
        title: &str,
        content: &str,
        is_anonymous: bool,
    ) -> Result<ForumPost, PostgresError> {
        let author = if is_anonymous { None } else { Some(author_id) };
        Ok(sqlx::query_as::<_, ForumPost>(
            r#"
            INSERT INTO forum_posts (topic_id, author_id, title, content, is_anonymous)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(topic_id)
        .bind(author)
        .bind(title)
        .bind(content)
        .bind(is_anonymous)
        .fetch_one(&self.pool)
        .await?)
    }

    /// A live (not soft-deleted) post
    pub async fn get_post(&self, post_id: i64) -> Result<Option<ForumPost>, PostgresError> {
        Ok(sqlx::query_as::<_, ForumPost>(
            "SELECT * FROM forum_posts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Which of `post_ids` the user has liked
    pub async fn liked_post_ids(&self, user_id: &str, post_ids: &[i64]) -> Result<HashSet<i64>, PostgresError> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT post_id FROM post_likes WHERE user_id = $1 AND post_id = ANY($2)")
                .bind(user_id)
                .bind(post_ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Toggle the user's like; returns the new state and count
    ///
    /// The count is recomputed from `post_likes`, so racing toggles by the same
    /// user cannot push it away from the number of like rows.
    pub async fn toggle_post_like(&self, post_id: i64, user_id: &str) -> Result<(bool, i32), PostgresError> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(post_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let (likes_count,): (i32,) = sqlx::query_as(
            r#"
            UPDATE forum_posts
            SET likes_count = (SELECT COUNT(*) FROM post_likes WHERE post_id = $1)::INTEGER
            WHERE id = $1
            RETURNING likes_count
            "#,
        )
        .bind(post_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((!removed, likes_count))
    }

    pub async fn create_reply(
        &self,
        post_id: i64,
        author_id: &str,
        content: &str,
        is_anonymous: bool,
    ) -> Result<PostReply, PostgresError> {
        let author = if is_anonymous { None } else { Some(author_id) };
        Ok(sqlx::query_as::<_, PostReply>(
            r#"
            INSERT INTO post_replies (post_id, author_id, content, is_anonymous)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(author)
        .bind(content)
        .bind(is_anonymous)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Replies to a post, oldest first
    pub async fn list_replies(&self, post_id: i64, limit: i64, offset: i64) -> Result<Vec<PostReply>, PostgresError> {
        Ok(sqlx::query_as::<_, PostReply>(
            "SELECT * FROM post_replies WHERE post_id = $1 ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3",
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Soft-delete the author's post and file it in their vault
    pub async fn soft_delete_post(&self, post_id: i64, author_id: &str) -> Result<(), PostgresError> {
        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, ForumPost>(
            r#"
            UPDATE forum_posts SET deleted_at = NOW()
            WHERE id = $1 AND author_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| PostgresError::NotFound("Post not found".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO deleted_posts (user_id, original_post_id, topic_id, title, content, expires_at)
            VALUES ($1, $2, $3, $4, $5, NOW() + make_interval(days => $6))
            "#,
        )
        .bind(author_id)
        .bind(post.id)
        .bind(post.topic_id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(RESTORE_WINDOW_DAYS)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Post {} moved to the vault of {}", post_id, author_id);
        Ok(())
    }
}
