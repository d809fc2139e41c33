use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{DeletedPost, DeletedPostView, MessageResponse, SaveDraftRequest, SuccessResponse, VaultResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/vault")
            .route("", web::get().to(get_vault))
            .route("/drafts", web::post().to(save_draft))
            .route("/drafts/{id}", web::delete().to(delete_draft))
            .route("/archive/{post_id}", web::post().to(archive_post))
            .route("/unarchive/{id}", web::post().to(unarchive))
            .route("/restore/{id}", web::post().to(restore))
            .route("/delete/{id}", web::delete().to(delete_permanently)),
    );
}

async fn load_deleted(state: &AppState, user_id: &str, id: i64) -> Result<DeletedPost, ApiError> {
    state
        .postgres
        .get_deleted_post(user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Deleted post not found"))
}

/// GET /api/vault
async fn get_vault(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let drafts = state.postgres.list_drafts(auth.id()).await?;
    let archived = state.postgres.list_archived(auth.id()).await?;

    let now = Utc::now();
    let deleted = state
        .postgres
        .list_deleted_posts(auth.id())
        .await?
        .into_iter()
        .map(|post| DeletedPostView {
            is_expired: post.is_expired(now),
            post,
        })
        .collect();

    Ok(HttpResponse::Ok().json(VaultResponse { drafts, archived, deleted }))
}

/// POST /api/vault/drafts
async fn save_draft(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<SaveDraftRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    if let Some(topic_id) = req.topic_id {
        if state.postgres.get_topic(topic_id).await?.is_none() {
            return Err(ApiError::not_found("Topic not found"));
        }
    }

    let draft = state
        .postgres
        .save_draft(auth.id(), req.topic_id, req.title.as_deref(), req.content.as_deref())
        .await?;
    Ok(HttpResponse::Created().json(draft))
}

/// DELETE /api/vault/drafts/{id}
async fn delete_draft(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.delete_draft(auth.id(), path.into_inner()).await? {
        return Err(ApiError::not_found("Draft not found"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/vault/archive/{post_id}
///
/// Only the caller's own live posts can be archived.
async fn archive_post(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let post = state
        .postgres
        .get_post(path.into_inner())
        .await?
        .filter(|p| p.author_id.as_deref() == Some(auth.id()))
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let item = state.postgres.archive_post(auth.id(), &post).await?;
    Ok(HttpResponse::Created().json(item))
}

/// POST /api/vault/unarchive/{id}
async fn unarchive(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unarchive(auth.id(), path.into_inner()).await? {
        return Err(ApiError::not_found("Archived item not found"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/vault/restore/{id}
async fn restore(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let deleted = load_deleted(&state, auth.id(), path.into_inner()).await?;
    if deleted.is_expired(Utc::now()) {
        return Err(ApiError::bad_request("Restore window has expired"));
    }

    state.postgres.restore_deleted_post(&deleted).await?;
    tracing::info!("Post {:?} restored by {}", deleted.original_post_id, auth.id());

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post restored")))
}

/// DELETE /api/vault/delete/{id}
async fn delete_permanently(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let deleted = load_deleted(&state, auth.id(), path.into_inner()).await?;
    state.postgres.purge_deleted_post(&deleted).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post permanently deleted")))
}
