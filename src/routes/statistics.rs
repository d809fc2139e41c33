use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::{AppState, AuthUser};
use crate::core::{profile_completion, response_rate};
use crate::error::ApiError;
use crate::models::StatisticsResponse;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/statistics", web::get().to(get_statistics));
}

/// GET /api/statistics
async fn get_statistics(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let counts = state.postgres.activity_counts(auth.id()).await?;
    let profile = state.postgres.get_profile(auth.id()).await?;

    let now = Utc::now();
    let account_created_at = auth.user.created_at;
    let last_active = profile
        .as_ref()
        .map(|p| p.last_active)
        .unwrap_or(auth.user.updated_at);

    Ok(HttpResponse::Ok().json(StatisticsResponse {
        collaborations_total: counts.collaborations_sent + counts.collaborations_received,
        account_created_at,
        account_age_days: (now - account_created_at).num_days().max(0),
        last_active,
        profile_completion: profile_completion(profile.as_ref()),
        response_rate: response_rate(counts.messages_sent, counts.messages_received),
        counts,
    }))
}
