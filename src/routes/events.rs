use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{
    AttendeeView, CreateEventRequest, Event, EventDetailView, EventSummaryView, EventsQuery,
    RsvpRequest, RsvpStatus, SuccessResponse, UpdateEventRequest,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/{id}", web::get().to(get_event))
            .route("/{id}", web::put().to(update_event))
            .route("/{id}", web::delete().to(delete_event))
            .route("/{id}/rsvp", web::post().to(rsvp)),
    );
}

async fn load_event(state: &AppState, id: i64) -> Result<Event, ApiError> {
    state
        .postgres
        .get_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

/// Load an event the caller created, 403 for anyone else
async fn load_owned_event(state: &AppState, id: i64, user_id: &str) -> Result<Event, ApiError> {
    let event = load_event(state, id).await?;
    if event.creator_id != user_id {
        return Err(ApiError::forbidden("Only the creator can modify this event"));
    }
    Ok(event)
}

/// GET /api/events
async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<EventsQuery>,
) -> Result<HttpResponse, ApiError> {
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(ApiError::bad_request("startDate must be before endDate"));
        }
    }

    let events = state.postgres.list_events(&query).await?;
    let creators = state
        .summaries(events.iter().map(|e| e.event.creator_id.clone()))
        .await?;

    let views: Vec<EventSummaryView> = events
        .into_iter()
        .map(|e| EventSummaryView {
            creator: creators.get(&e.event.creator_id).cloned(),
            attendee_count: e.attendee_count,
            event: e.event,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// Virtual events must carry a non-blank link
fn require_virtual_link(is_virtual: bool, link: Option<&str>) -> Result<(), ApiError> {
    let has_link = link.map(|l| !l.trim().is_empty()).unwrap_or(false);
    if is_virtual && !has_link {
        return Err(ApiError::Validation {
            message: "Virtual events need a link".to_string(),
            field: Some("virtualLink".to_string()),
        });
    }
    Ok(())
}

/// POST /api/events
async fn create_event(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    require_virtual_link(req.is_virtual, req.virtual_link.as_deref())?;

    let event = state.postgres.create_event(auth.id(), &req).await?;
    Ok(HttpResponse::Created().json(event))
}

/// GET /api/events/{id}
async fn get_event(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let event = load_event(&state, path.into_inner()).await?;
    let attendees = state.postgres.list_attendees(event.id).await?;

    let users = state
        .summaries(
            attendees
                .iter()
                .map(|a| a.user_id.clone())
                .chain(std::iter::once(event.creator_id.clone())),
        )
        .await?;

    let going_count = attendees
        .iter()
        .filter(|a| a.status == RsvpStatus::Going)
        .count() as i64;

    let attendees = attendees
        .into_iter()
        .map(|attendee| AttendeeView {
            user: users.get(&attendee.user_id).cloned(),
            attendee,
        })
        .collect();

    Ok(HttpResponse::Ok().json(EventDetailView {
        creator: users.get(&event.creator_id).cloned(),
        event,
        attendees,
        going_count,
    }))
}

/// PUT /api/events/{id}
async fn update_event(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let event = load_owned_event(&state, path.into_inner(), auth.id()).await?;
    require_virtual_link(
        req.is_virtual.unwrap_or(event.is_virtual),
        req.virtual_link.as_deref().or(event.virtual_link.as_deref()),
    )?;

    let updated = state.postgres.update_event(event.id, &req).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/events/{id}
async fn delete_event(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let event = load_owned_event(&state, path.into_inner(), auth.id()).await?;

    if !state.postgres.delete_event(event.id).await? {
        return Err(ApiError::not_found("Event not found"));
    }
    tracing::info!("Event {} deleted by {}", event.id, auth.id());
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/events/{id}/rsvp
async fn rsvp(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<RsvpRequest>,
) -> Result<HttpResponse, ApiError> {
    let attendee = state
        .postgres
        .rsvp(path.into_inner(), auth.id(), req.status)
        .await?;
    Ok(HttpResponse::Ok().json(attendee))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_link_rule() {
        assert!(require_virtual_link(false, None).is_ok());
        assert!(require_virtual_link(true, Some("https://meet.example.com/abc")).is_ok());

        match require_virtual_link(true, Some("   ")) {
            Err(ApiError::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("virtualLink")),
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_to_virtual_checks_merged_link() {
        // An in-person event switched to virtual without a link in either place
        let stored_link: Option<&str> = None;
        let requested_link: Option<&str> = None;
        assert!(require_virtual_link(true, requested_link.or(stored_link)).is_err());

        // The stored link still counts when the update leaves it out
        assert!(require_virtual_link(true, requested_link.or(Some("https://live.example.com"))).is_ok());
    }
}
