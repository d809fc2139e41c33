use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{BlockRequest, ReportRequest, SuccessResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blocks")
            .route("", web::get().to(list_blocks))
            .route("", web::post().to(block))
            .route("/{id}", web::delete().to(unblock)),
    )
    .route("/reports", web::post().to(report));
}

/// GET /api/blocks
async fn list_blocks(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.postgres.list_blocks(auth.id()).await?))
}

/// POST /api/blocks
async fn block(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<BlockRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let blocked_id = req.blocked_id.trim();
    if blocked_id == auth.id() {
        return Err(ApiError::bad_request("Cannot block yourself"));
    }
    state.postgres.require_user(blocked_id).await?;

    let block = state.postgres.create_block(auth.id(), blocked_id).await?;
    tracing::info!("User {} blocked {}", auth.id(), blocked_id);
    Ok(HttpResponse::Created().json(block))
}

/// DELETE /api/blocks/{id}
async fn unblock(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.delete_block(path.into_inner(), auth.id()).await? {
        return Err(ApiError::not_found("Block not found"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/reports
async fn report(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<ReportRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let reported_id = req.reported_id.trim();
    if reported_id == auth.id() {
        return Err(ApiError::bad_request("Cannot report yourself"));
    }
    state.postgres.require_user(reported_id).await?;

    let report = state
        .postgres
        .create_report(auth.id(), reported_id, req.reason.trim(), req.description.as_deref())
        .await?;

    tracing::info!("Report {} filed against {}", report.id, reported_id);
    Ok(HttpResponse::Created().json(report))
}
