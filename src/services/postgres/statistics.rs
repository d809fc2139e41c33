use super::{PostgresClient, PostgresError};
use crate::models::ActivityCounts;

impl PostgresClient {
    /// All activity counters for one user in a single round trip
    pub async fn activity_counts(&self, user_id: &str) -> Result<ActivityCounts, PostgresError> {
        Ok(sqlx::query_as::<_, ActivityCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM seen_profiles WHERE target_user_id = $1) AS profile_views,
                (SELECT COUNT(*) FROM likes WHERE liker_id = $1) AS likes_sent,
                (SELECT COUNT(*) FROM likes WHERE liked_id = $1) AS likes_received,
                (SELECT COUNT(*) FROM matches
                 WHERE (user1_id = $1 OR user2_id = $1) AND is_active = TRUE) AS matches,
                (SELECT COUNT(*) FROM messages WHERE sender_id = $1) AS messages_sent,
                (SELECT COUNT(*) FROM messages m JOIN matches x ON x.id = m.match_id
                 WHERE (x.user1_id = $1 OR x.user2_id = $1) AND m.sender_id <> $1) AS messages_received,
                (SELECT COUNT(*) FROM forum_posts
                 WHERE author_id = $1 AND deleted_at IS NULL) AS posts,
                (SELECT COALESCE(SUM(likes_count), 0)::BIGINT FROM forum_posts
                 WHERE author_id = $1 AND deleted_at IS NULL) AS post_likes_received,
                (SELECT COUNT(*) FROM post_replies WHERE author_id = $1) AS replies,
                (SELECT COUNT(*) FROM collaborations WHERE requester_id = $1) AS collaborations_sent,
                (SELECT COUNT(*) FROM collaborations WHERE receiver_id = $1) AS collaborations_received,
                (SELECT COUNT(*) FROM follows WHERE following_id = $1) AS followers,
                (SELECT COUNT(*) FROM follows WHERE follower_id = $1) AS following
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }
}
