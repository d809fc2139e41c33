use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::community::post_views;
use super::profiles::saved_profile_views;
use super::{AppState, AuthUser};
use crate::core::RecentPeriod;
use crate::error::ApiError;
use crate::models::{
    ConnectionEntry, RecentConnection, RecentKind, RecentQuery, RestrictedEntry,
    RestrictionUpdateRequest, SuccessResponse,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/connections")
            .route("/followers", web::get().to(followers))
            .route("/following", web::get().to(following))
            .route("/following/{user_id}", web::post().to(follow))
            .route("/following/{user_id}", web::delete().to(unfollow))
            .route("/muted", web::get().to(muted))
            .route("/muted/{user_id}", web::post().to(mute))
            .route("/muted/{user_id}", web::delete().to(unmute))
            .route("/restricted", web::get().to(restricted))
            .route("/restricted/{user_id}", web::put().to(restrict))
            .route("/restricted/{user_id}", web::delete().to(unrestrict))
            .route("/recent", web::get().to(recent))
            .route("/bookmarks", web::get().to(bookmarks))
            .route("/bookmarks/{user_id}", web::delete().to(remove_bookmark))
            .route("/tagged", web::get().to(tagged)),
    )
    .route("/tagged", web::get().to(tagged));
}

/// Refuse self-targeting and unknown users
async fn other_user(state: &AppState, auth: &AuthUser, target: &str, action: &str) -> Result<(), ApiError> {
    if target == auth.id() {
        return Err(ApiError::bad_request(format!("Cannot {} yourself", action)));
    }
    state.postgres.require_user(target).await?;
    Ok(())
}

async fn entries(
    state: &AppState,
    rows: Vec<(i64, String, chrono::DateTime<Utc>)>,
) -> Result<Vec<ConnectionEntry>, ApiError> {
    let users = state.summaries(rows.iter().map(|(_, uid, _)| uid.clone())).await?;
    Ok(rows
        .into_iter()
        .map(|(id, uid, created_at)| ConnectionEntry {
            id,
            user: users.get(&uid).cloned(),
            created_at,
        })
        .collect())
}

/// GET /api/connections/followers
async fn followers(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let rows = state
        .postgres
        .followers(auth.id())
        .await?
        .into_iter()
        .map(|f| (f.id, f.follower_id, f.created_at))
        .collect();
    Ok(HttpResponse::Ok().json(entries(&state, rows).await?))
}

/// GET /api/connections/following
async fn following(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let rows = state
        .postgres
        .following(auth.id())
        .await?
        .into_iter()
        .map(|f| (f.id, f.following_id, f.created_at))
        .collect();
    Ok(HttpResponse::Ok().json(entries(&state, rows).await?))
}

/// POST /api/connections/following/{user_id}
async fn follow(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    other_user(&state, &auth, &path, "follow").await?;
    let follow = state.postgres.follow(auth.id(), &path).await?;
    Ok(HttpResponse::Created().json(follow))
}

/// DELETE /api/connections/following/{user_id}
async fn unfollow(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unfollow(auth.id(), &path).await? {
        return Err(ApiError::not_found("Not following this user"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/connections/muted
async fn muted(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let rows = state
        .postgres
        .muted_users(auth.id())
        .await?
        .into_iter()
        .map(|m| (m.id, m.muted_user_id, m.created_at))
        .collect();
    Ok(HttpResponse::Ok().json(entries(&state, rows).await?))
}

/// POST /api/connections/muted/{user_id}
async fn mute(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    other_user(&state, &auth, &path, "mute").await?;
    let muted = state.postgres.mute(auth.id(), &path).await?;
    Ok(HttpResponse::Created().json(muted))
}

/// DELETE /api/connections/muted/{user_id}
async fn unmute(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unmute(auth.id(), &path).await? {
        return Err(ApiError::not_found("User is not muted"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/connections/restricted
async fn restricted(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let rows = state.postgres.restricted_users(auth.id()).await?;
    let users = state
        .summaries(rows.iter().map(|r| r.restricted_user_id.clone()))
        .await?;

    let views: Vec<RestrictedEntry> = rows
        .into_iter()
        .map(|r| RestrictedEntry {
            id: r.id,
            user: users.get(&r.restricted_user_id).cloned(),
            restrictions: r.restrictions,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
        .collect();
    Ok(HttpResponse::Ok().json(views))
}

/// PUT /api/connections/restricted/{user_id}
async fn restrict(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
    req: web::Json<RestrictionUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    other_user(&state, &auth, &path, "restrict").await?;
    let row = state
        .postgres
        .restrict(auth.id(), &path, &req.restrictions)
        .await?;

    tracing::info!("{} updated restrictions on {}", auth.id(), row.restricted_user_id);
    Ok(HttpResponse::Ok().json(row))
}

/// DELETE /api/connections/restricted/{user_id}
async fn unrestrict(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unrestrict(auth.id(), &path).await? {
        return Err(ApiError::not_found("User is not restricted"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/connections/recent?period=24h|week|month
async fn recent(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<RecentQuery>,
) -> Result<HttpResponse, ApiError> {
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<RecentPeriod>().map_err(ApiError::bad_request)?,
        None => RecentPeriod::default(),
    };
    let since = period.threshold(Utc::now());

    let follows = state.postgres.follows_since(auth.id(), since).await?;
    let collaborations = state.postgres.collaborations_since(auth.id(), since).await?;

    let mut rows: Vec<(String, RecentKind, String, chrono::DateTime<Utc>)> = follows
        .into_iter()
        .map(|f| (format!("follow_{}", f.id), RecentKind::Follow, f.following_id, f.created_at))
        .collect();
    rows.extend(collaborations.into_iter().map(|c| {
        let other = if c.requester_id == auth.id() {
            c.receiver_id
        } else {
            c.requester_id
        };
        (format!("collab_{}", c.id), RecentKind::Collaboration, other, c.created_at)
    }));
    rows.sort_by(|a, b| b.3.cmp(&a.3));

    let users = state.summaries(rows.iter().map(|r| r.2.clone())).await?;
    let views: Vec<RecentConnection> = rows
        .into_iter()
        .map(|(id, kind, uid, created_at)| RecentConnection {
            id,
            kind,
            user: users.get(&uid).cloned(),
            created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/connections/bookmarks
async fn bookmarks(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(saved_profile_views(&state, auth.id()).await?))
}

/// DELETE /api/connections/bookmarks/{user_id}
async fn remove_bookmark(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unsave_profile(auth.id(), &path).await? {
        return Err(ApiError::not_found("Bookmark not found"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/connections/tagged and /api/tagged
async fn tagged(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let posts = state.postgres.tagged_posts(auth.id()).await?;
    Ok(HttpResponse::Ok().json(post_views(&state, posts, Some(auth.id())).await?))
}
