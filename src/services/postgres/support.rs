use super::{PostgresClient, PostgresError};
use crate::models::{SupportCategory, SupportTicket};

impl PostgresClient {
    pub async fn create_support_ticket(
        &self,
        user_id: Option<&str>,
        subject: &str,
        category: SupportCategory,
        message: &str,
        email: Option<&str>,
    ) -> Result<SupportTicket, PostgresError> {
        let ticket = sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (user_id, subject, category, message, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(subject)
        .bind(category)
        .bind(message)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Support ticket {} opened ({:?})", ticket.id, ticket.category);
        Ok(ticket)
    }
}
