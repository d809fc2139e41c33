use actix_web::{web, HttpRequest, HttpResponse};
use validator::Validate;

use super::extract::session_id;
use super::{AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest, SessionUser,
    User,
};
use crate::services::{hash_password, verify_password, CacheKey};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/user", web::get().to(current_user))
            .route("/logout", web::get().to(logout))
            .route("/logout", web::post().to(logout))
            .route("/password", web::put().to(change_password)),
    );
}

/// Emails are stored trimmed and lowercased
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Open a session for `user` and answer with the cookie set
async fn start_session(
    state: &AppState,
    user: User,
    message: &str,
    created: bool,
) -> Result<HttpResponse, ApiError> {
    let session = state
        .postgres
        .create_session(&user.id, state.sessions.ttl())
        .await?;

    let cached = SessionUser {
        user: user.clone(),
        expires_at: session.expires_at,
    };
    if let Err(e) = state.cache.set(&CacheKey::session(&session.sid), &cached).await {
        tracing::warn!("Failed to cache session for {}: {}", user.id, e);
    }
    if let Err(e) = state.postgres.touch_last_active(&user.id).await {
        tracing::warn!("Failed to update last active for {}: {}", user.id, e);
    }

    let mut response = if created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };

    Ok(response
        .cookie(state.sessions.cookie(&session.sid))
        .json(AuthResponse {
            message: message.to_string(),
            user,
        }))
}

/// POST /api/auth/register
async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    let email = normalize_email(&req.email);

    if state.postgres.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password = req.password;
    let password_hash = web::block(move || hash_password(&password)).await??;

    let user = state
        .postgres
        .create_user(&email, req.first_name.trim(), req.last_name.trim(), &password_hash)
        .await?;

    tracing::info!("Registered user {}", user.id);
    start_session(&state, user, "Registration successful", true).await
}

/// POST /api/auth/login
async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .postgres
        .get_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;
    let stored = user.password_hash.clone().ok_or_else(invalid)?;

    let password = req.password;
    let valid = web::block(move || verify_password(&password, &stored)).await?;
    if !valid {
        tracing::info!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    start_session(&state, user, "Login successful", false).await
}

/// GET /api/auth/user
async fn current_user(auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(auth.user))
}

/// GET|POST /api/auth/logout
///
/// Always clears the cookie, even when the session is already gone.
async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    if let Some(sid) = session_id(&req) {
        state.postgres.delete_session(&sid).await?;
        state.cache.forget(&CacheKey::session(&sid)).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(state.sessions.expired_cookie())
        .json(MessageResponse::new("Logged out")))
}

/// PUT /api/auth/password
///
/// Other sessions of the user are signed out; the current one stays valid.
async fn change_password(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    // Cached session users carry no hash
    let user = state
        .postgres
        .get_user(auth.id())
        .await?
        .ok_or_else(ApiError::unauthorized)?;
    let stored = user
        .password_hash
        .ok_or_else(|| ApiError::bad_request("Account has no password set"))?;

    let current = req.current_password;
    let valid = web::block(move || verify_password(&current, &stored)).await?;
    if !valid {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let new_password = req.new_password;
    let new_hash = web::block(move || hash_password(&new_password)).await??;
    state.postgres.update_password_hash(auth.id(), &new_hash).await?;

    let revoked = state.postgres.delete_other_sessions(auth.id(), &auth.sid).await?;
    for sid in &revoked {
        state.cache.forget(&CacheKey::session(sid)).await;
    }
    tracing::info!("Password changed for {} ({} other sessions revoked)", auth.id(), revoked.len());

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
