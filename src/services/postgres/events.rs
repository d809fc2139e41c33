use super::{PostgresClient, PostgresError};
use crate::models::{
    CreateEventRequest, Event, EventAttendee, EventsQuery, RsvpStatus, UpdateEventRequest,
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventWithCount {
    #[sqlx(flatten)]
    pub event: Event,
    pub attendee_count: i64,
}

impl PostgresClient {
    /// Events in date order, optionally windowed and filtered by virtual/in-person
    pub async fn list_events(&self, query: &EventsQuery) -> Result<Vec<EventWithCount>, PostgresError> {
        Ok(sqlx::query_as::<_, EventWithCount>(
            r#"
            SELECT e.*,
                (SELECT COUNT(*) FROM event_attendees a
                 WHERE a.event_id = e.id AND a.status = 'going') AS attendee_count
            FROM events e
            WHERE ($1::timestamptz IS NULL OR e.event_date >= $1)
              AND ($2::timestamptz IS NULL OR e.event_date <= $2)
              AND ($3::boolean IS NULL OR e.is_virtual = $3)
            ORDER BY e.event_date ASC
            "#,
        )
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(query.is_virtual)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create_event(&self, creator_id: &str, req: &CreateEventRequest) -> Result<Event, PostgresError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (creator_id, title, description, location, latitude, longitude,
                                event_date, is_virtual, virtual_link, max_attendees)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(creator_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.location)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.event_date)
        .bind(req.is_virtual)
        .bind(&req.virtual_link)
        .bind(req.max_attendees)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Event {} created by {}", event.id, creator_id);
        Ok(event)
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Option<Event>, PostgresError> {
        Ok(sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn update_event(&self, event_id: i64, req: &UpdateEventRequest) -> Result<Event, PostgresError> {
        sqlx::query_as::<_, Event>(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                location = COALESCE($4, location),
                latitude = COALESCE($5, latitude),
                longitude = COALESCE($6, longitude),
                event_date = COALESCE($7, event_date),
                is_virtual = COALESCE($8, is_virtual),
                virtual_link = COALESCE($9, virtual_link),
                max_attendees = COALESCE($10, max_attendees)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.location)
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.event_date)
        .bind(req.is_virtual)
        .bind(&req.virtual_link)
        .bind(req.max_attendees)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PostgresError::NotFound("Event not found".to_string()))
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<bool, PostgresError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_attendees(&self, event_id: i64) -> Result<Vec<EventAttendee>, PostgresError> {
        Ok(sqlx::query_as::<_, EventAttendee>(
            "SELECT * FROM event_attendees WHERE event_id = $1 ORDER BY created_at ASC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Create or change the user's RSVP
    ///
    /// The event row is locked so concurrent "going" RSVPs cannot overfill it.
    pub async fn rsvp(
        &self,
        event_id: i64,
        user_id: &str,
        status: RsvpStatus,
    ) -> Result<EventAttendee, PostgresError> {
        let mut tx = self.pool.begin().await?;

        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| PostgresError::NotFound("Event not found".to_string()))?;

        if let (RsvpStatus::Going, Some(max)) = (status, event.max_attendees) {
            let (going,): (i64,) = sqlx::query_as(
                r#"
                SELECT COUNT(*) FROM event_attendees
                WHERE event_id = $1 AND status = 'going' AND user_id <> $2
                "#,
            )
            .bind(event_id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            if going >= i64::from(max) {
                return Err(PostgresError::Conflict("Event is full".to_string()));
            }
        }

        let attendee = sqlx::query_as::<_, EventAttendee>(
            r#"
            INSERT INTO event_attendees (event_id, user_id, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, user_id) DO UPDATE SET status = EXCLUDED.status
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attendee)
    }
}
