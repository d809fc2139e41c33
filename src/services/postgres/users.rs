use chrono::{Duration, Utc};

use super::{on_unique, PostgresClient, PostgresError};
use crate::models::{Session, SessionUser, User};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, display_name, profile_image_url, password_hash, created_at, updated_at";

/// `USER_COLUMNS` qualified with a table alias
fn qualified_user_columns(alias: &str) -> String {
    USER_COLUMNS
        .split(", ")
        .map(|column| format!("{}.{}", alias, column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Opaque 64-hex-character session id
pub fn new_session_id() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

impl PostgresClient {
    /// Create an account; the email must already be normalized
    pub async fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User, PostgresError> {
        let id = uuid::Uuid::new_v4().to_string();
        let query = format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let result = sqlx::query_as::<_, User>(&query)
            .bind(&id)
            .bind(email)
            .bind(first_name)
            .bind(last_name)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await;

        let user = on_unique(result, || {
            PostgresError::InvalidInput("Email already registered".to_string())
        })?;

        tracing::info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, PostgresError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn user_exists(&self, user_id: &str) -> Result<bool, PostgresError> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    /// Fail with NotFound unless the user exists
    pub async fn require_user(&self, user_id: &str) -> Result<(), PostgresError> {
        if self.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(PostgresError::NotFound("User not found".to_string()))
        }
    }

    pub async fn update_password_hash(
        &self,
        user_id: &str,
        password_hash: &str,
    ) -> Result<(), PostgresError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Create a session that expires after `ttl`
    pub async fn create_session(&self, user_id: &str, ttl: Duration) -> Result<Session, PostgresError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (sid, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING sid, user_id, expires_at, created_at
            "#,
        )
        .bind(new_session_id())
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created session for user {}", user_id);
        Ok(session)
    }

    /// Resolve a session id to its user and expiry
    ///
    /// An expired session is deleted on lookup and resolves to `None`.
    pub async fn get_session_user(&self, sid: &str) -> Result<Option<SessionUser>, PostgresError> {
        let query = format!(
            r#"
            SELECT {}, s.expires_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.sid = $1 AND s.expires_at > NOW()
            "#,
            qualified_user_columns("u")
        );

        let session = sqlx::query_as::<_, SessionUser>(&query)
            .bind(sid)
            .fetch_optional(&self.pool)
            .await?;

        if session.is_none() {
            sqlx::query("DELETE FROM sessions WHERE sid = $1 AND expires_at <= NOW()")
                .bind(sid)
                .execute(&self.pool)
                .await?;
        }

        Ok(session)
    }

    pub async fn delete_session(&self, sid: &str) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM sessions WHERE sid = $1")
            .bind(sid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every other session of a user, e.g. after a password change
    ///
    /// Returns the revoked session ids so their cache entries can be dropped.
    pub async fn delete_other_sessions(&self, user_id: &str, keep_sid: &str) -> Result<Vec<String>, PostgresError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("DELETE FROM sessions WHERE user_id = $1 AND sid <> $2 RETURNING sid")
                .bind(user_id)
                .bind(keep_sid)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(sid,)| sid).collect())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, PostgresError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_shape() {
        let sid = new_session_id();
        assert_eq!(sid.len(), 64);
        assert!(sid.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(sid, new_session_id());
    }

    #[test]
    fn test_qualified_user_columns() {
        let columns = qualified_user_columns("u");
        assert!(columns.starts_with("u.id, u.email, "));
        assert!(columns.ends_with("u.updated_at"));
    }
}
