use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{CreateSafetyAlertRequest, SafetyAlert, SafetyAlertView, SafetyAlertsQuery};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/safety-alerts")
            .route("", web::get().to(list_alerts))
            .route("", web::post().to(create_alert))
            .route("/{id}", web::get().to(get_alert))
            .route("/{id}/resolve", web::patch().to(resolve_alert)),
    );
}

async fn with_reporters(state: &AppState, alerts: Vec<SafetyAlert>) -> Result<Vec<SafetyAlertView>, ApiError> {
    let reporters = state
        .summaries(alerts.iter().map(|a| a.reporter_id.clone()))
        .await?;

    Ok(alerts
        .into_iter()
        .map(|alert| SafetyAlertView {
            reporter: reporters.get(&alert.reporter_id).cloned(),
            alert,
        })
        .collect())
}

/// GET /api/safety-alerts
async fn list_alerts(
    state: web::Data<AppState>,
    query: web::Query<SafetyAlertsQuery>,
) -> Result<HttpResponse, ApiError> {
    let alerts = state.postgres.list_safety_alerts(query.alert_type).await?;
    Ok(HttpResponse::Ok().json(with_reporters(&state, alerts).await?))
}

/// POST /api/safety-alerts
async fn create_alert(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<CreateSafetyAlertRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let alert = state.postgres.create_safety_alert(auth.id(), &req).await?;

    tracing::info!("Safety alert {} ({:?}) filed by {}", alert.id, alert.alert_type, auth.id());
    Ok(HttpResponse::Created().json(alert))
}

/// GET /api/safety-alerts/{id}
async fn get_alert(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let alert = state
        .postgres
        .get_safety_alert(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Safety alert not found"))?;

    let mut views = with_reporters(&state, vec![alert]).await?;
    match views.pop() {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Err(ApiError::not_found("Safety alert not found")),
    }
}

/// PATCH /api/safety-alerts/{id}/resolve
async fn resolve_alert(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let alert = state
        .postgres
        .get_safety_alert(path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Safety alert not found"))?;

    if alert.reporter_id != auth.id() {
        return Err(ApiError::forbidden("Only the reporter can resolve this alert"));
    }

    let resolved = state.postgres.resolve_safety_alert(alert.id).await?;
    Ok(HttpResponse::Ok().json(resolved))
}
