use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{
    LikeOutcome, LikeRequest, Match, MatchView, PassRequest, ReceivedLike, SeenEventType,
    SendMessageRequest, SuccessResponse,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/likes")
            .route("", web::post().to(like))
            .route("/received", web::get().to(likes_received))
            .route("/pass", web::post().to(pass)),
    )
    .service(
        web::scope("/matches")
            .route("", web::get().to(list_matches))
            .route("/{id}", web::get().to(get_match))
            .route("/{id}", web::delete().to(unmatch))
            .route("/{id}/messages", web::post().to(send_message))
            .route("/{id}/messages", web::get().to(list_messages))
            .route("/{id}/messages/read", web::patch().to(mark_read))
            .route("/{id}/messages/read", web::post().to(mark_read)),
    );
}

/// Load a match the caller takes part in: 404 if missing, 403 otherwise
async fn participant_match(state: &AppState, match_id: i64, user_id: &str) -> Result<Match, ApiError> {
    let matched = state
        .postgres
        .get_match(match_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Match not found"))?;

    if !matched.involves(user_id) {
        return Err(ApiError::forbidden("Not a participant of this match"));
    }
    Ok(matched)
}

/// POST /api/likes
///
/// A reciprocated like creates a match and returns `{match, like}`.
async fn like(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<LikeRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let liked_id = req.liked_id.trim();

    if liked_id == auth.id() {
        return Err(ApiError::bad_request("Cannot like yourself"));
    }
    state.postgres.require_user(liked_id).await?;
    if state.postgres.is_blocked_either_way(auth.id(), liked_id).await? {
        return Err(ApiError::bad_request("Cannot like this user"));
    }

    let (like, matched) = state
        .postgres
        .like_user(auth.id(), liked_id, req.is_super_like)
        .await?;

    let outcome = match matched {
        Some(matched) => LikeOutcome::Matched { matched, like },
        None => LikeOutcome::Liked(like),
    };
    Ok(HttpResponse::Created().json(outcome))
}

/// GET /api/likes/received
async fn likes_received(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let likes = state.postgres.likes_received(auth.id()).await?;
    let users = state.summaries(likes.iter().map(|l| l.liker_id.clone())).await?;

    let received: Vec<ReceivedLike> = likes
        .into_iter()
        .map(|like| {
            let liker = users.get(&like.liker_id).cloned();
            ReceivedLike { like, liker }
        })
        .collect();

    Ok(HttpResponse::Ok().json(received))
}

/// POST /api/likes/pass
async fn pass(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<PassRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let passed_id = req.passed_id.trim();
    if passed_id == auth.id() {
        return Err(ApiError::bad_request("Cannot pass on yourself"));
    }
    state.postgres.require_user(passed_id).await?;

    state
        .postgres
        .record_seen(auth.id(), passed_id, SeenEventType::Passed)
        .await?;
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// GET /api/matches
async fn list_matches(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let matches = state.postgres.list_matches(auth.id()).await?;

    let ids: Vec<i64> = matches.iter().map(|m| m.id).collect();
    let mut last = state.postgres.last_messages(&ids).await?;
    let users = state
        .summaries(matches.iter().flat_map(|m| [m.user1_id.clone(), m.user2_id.clone()]))
        .await?;

    let views: Vec<MatchView> = matches
        .into_iter()
        .map(|matched| MatchView {
            user1: users.get(&matched.user1_id).cloned(),
            user2: users.get(&matched.user2_id).cloned(),
            last_message: last.remove(&matched.id),
            matched,
        })
        .collect();

    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/matches/{id}
async fn get_match(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let matched = participant_match(&state, path.into_inner(), auth.id()).await?;
    let users = state
        .summaries([matched.user1_id.clone(), matched.user2_id.clone()])
        .await?;
    let mut last = state.postgres.last_messages(&[matched.id]).await?;

    Ok(HttpResponse::Ok().json(MatchView {
        user1: users.get(&matched.user1_id).cloned(),
        user2: users.get(&matched.user2_id).cloned(),
        last_message: last.remove(&matched.id),
        matched,
    }))
}

/// DELETE /api/matches/{id}
async fn unmatch(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let matched = participant_match(&state, path.into_inner(), auth.id()).await?;
    state.postgres.deactivate_match(matched.id).await?;

    tracing::info!("Match {} deactivated by {}", matched.id, auth.id());
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

/// POST /api/matches/{id}/messages
async fn send_message(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    if let Err(limited) = state.rate_limiter.check(auth.id()).await {
        tracing::info!("Message rate limit hit by {}", auth.id());
        return Err(ApiError::TooManyRequests(format!(
            "Too many messages, try again in {} seconds",
            limited.retry_after.as_secs().max(1)
        )));
    }

    let matched = participant_match(&state, path.into_inner(), auth.id()).await?;
    if !matched.is_active {
        return Err(ApiError::forbidden("This match is no longer active"));
    }

    let recipient = matched.other_participant(auth.id());
    if state.postgres.restrictions_on(recipient, auth.id()).await?.no_messages {
        return Err(ApiError::forbidden("This user is not accepting messages from you"));
    }

    let message = state
        .postgres
        .create_message(
            matched.id,
            auth.id(),
            req.content.trim(),
            req.message_type.as_deref().unwrap_or("text"),
            req.media_url.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(message))
}

/// GET /api/matches/{id}/messages
async fn list_messages(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let matched = participant_match(&state, path.into_inner(), auth.id()).await?;
    Ok(HttpResponse::Ok().json(state.postgres.list_messages(matched.id).await?))
}

/// PATCH|POST /api/matches/{id}/messages/read
async fn mark_read(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let matched = participant_match(&state, path.into_inner(), auth.id()).await?;
    let updated = state.postgres.mark_messages_read(matched.id, auth.id()).await?;

    tracing::debug!("Marked {} messages read in match {}", updated, matched.id);
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}
