use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, OptionalUser};
use crate::error::ApiError;
use crate::models::{SupportCategory, SupportRequest, SupportTicketResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/support", web::post().to(create_ticket));
}

/// POST /api/support
///
/// Signed-in users are linked to the ticket; anonymous senders must leave an email.
async fn create_ticket(
    state: web::Data<AppState>,
    viewer: OptionalUser,
    req: web::Json<SupportRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let category: SupportCategory = req.category.parse().map_err(|_| ApiError::Validation {
        message: "Invalid category".to_string(),
        field: Some("category".to_string()),
    })?;

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_lowercase);
    let email = match (viewer.id(), email) {
        (None, None) => {
            return Err(ApiError::Validation {
                message: "Email is required when not signed in".to_string(),
                field: Some("email".to_string()),
            })
        }
        (Some(_), None) => viewer.0.as_ref().and_then(|auth| auth.user.email.clone()),
        (_, email) => email,
    };

    let ticket = state
        .postgres
        .create_support_ticket(
            viewer.id(),
            req.subject.trim(),
            category,
            req.message.trim(),
            email.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(SupportTicketResponse {
        message: "Support ticket submitted".to_string(),
        ticket_id: ticket.id,
    }))
}
