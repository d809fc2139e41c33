//! Session extractors
//!
//! A session id is read from the `session_id` cookie or an
//! `Authorization: Bearer <sid>` header. Resolved sessions are cached.

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;

use super::AppState;
use crate::error::ApiError;
use crate::models::{SessionUser, User};
use crate::services::CacheKey;

pub const SESSION_COOKIE: &str = "session_id";

/// Session id carried by the request, if any
pub fn session_id(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|sid| !sid.is_empty())
        .map(str::to_string)
}

/// The signed-in user; rejects with 401 when there is no valid session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub sid: String,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

/// The signed-in user, or `None` for anonymous requests
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthUser>);

impl OptionalUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(AuthUser::id)
    }
}

async fn resolve(state: web::Data<AppState>, sid: String) -> Result<Option<AuthUser>, ApiError> {
    let key = CacheKey::session(&sid);
    if let Some(cached) = state.cache.get::<SessionUser>(&key).await {
        if cached.is_expired(Utc::now()) {
            state.cache.forget(&key).await;
            return Ok(None);
        }
        return Ok(Some(AuthUser { user: cached.user, sid }));
    }

    match state.postgres.get_session_user(&sid).await? {
        Some(session) => {
            if let Err(e) = state.cache.set(&key, &session).await {
                tracing::warn!("Failed to cache session: {}", e);
            }
            Ok(Some(AuthUser { user: session.user, sid }))
        }
        None => Ok(None),
    }
}

fn app_state(req: &HttpRequest) -> Result<web::Data<AppState>, ApiError> {
    req.app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("Application state missing".to_string()))
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let sid = session_id(req);

        Box::pin(async move {
            let sid = sid.ok_or_else(ApiError::unauthorized)?;
            resolve(state?, sid).await?.ok_or_else(ApiError::unauthorized)
        })
    }
}

impl FromRequest for OptionalUser {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let sid = session_id(req);

        Box::pin(async move {
            match sid {
                Some(sid) => Ok(OptionalUser(resolve(state?, sid).await?)),
                None => Ok(OptionalUser(None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[test]
    fn test_session_id_from_cookie() {
        let req = TestRequest::default()
            .cookie(Cookie::new(SESSION_COOKIE, "abc123"))
            .to_http_request();
        assert_eq!(session_id(&req).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_id_from_bearer_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer xyz"))
            .to_http_request();
        assert_eq!(session_id(&req).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_missing_session_id() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic Zm9vOmJhcg=="))
            .to_http_request();
        assert!(session_id(&req).is_none());
    }
}
