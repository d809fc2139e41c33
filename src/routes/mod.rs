// Route exports
pub mod auth;
pub mod collaborations;
pub mod community;
pub mod connections;
pub mod events;
pub mod extract;
pub mod health;
pub mod matching;
pub mod moderation;
pub mod profiles;
pub mod safety;
pub mod statistics;
pub mod support;
pub mod vault;

use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::web;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DiscoverySettings, MessagingSettings, SessionSettings, Settings};
use crate::core::{MessageRateLimiter, Ranker};
use crate::error::ApiError;
use crate::models::{ScoringWeights, UserSummary};
use crate::services::{CacheManager, PostgresClient};

pub use extract::{AuthUser, OptionalUser, SESSION_COOKIE};

/// How sessions are issued and carried in cookies
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub ttl_days: i64,
    pub secure_cookie: bool,
}

impl SessionPolicy {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.ttl_days)
    }

    /// `session_id` cookie carrying a freshly issued session
    pub fn cookie(&self, sid: &str) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, sid.to_string())
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookie)
            .max_age(time::Duration::days(self.ttl_days))
            .finish()
    }

    /// Cookie that makes the browser drop the session
    pub fn expired_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.cookie("");
        cookie.make_removal();
        cookie
    }
}

impl From<&SessionSettings> for SessionPolicy {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            ttl_days: settings.ttl_days,
            secure_cookie: settings.secure_cookie,
        }
    }
}

/// Default and maximum number of discovery results
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryLimits {
    pub default_limit: u16,
    pub max_limit: u16,
    pub candidate_pool: u32,
}

impl DiscoveryLimits {
    /// Requested limit clamped to `1..=max_limit`
    pub fn resolve(&self, requested: Option<u16>) -> usize {
        let limit = requested.unwrap_or(self.default_limit).clamp(1, self.max_limit.max(1));
        usize::from(limit)
    }

    /// Candidates to pull for ranking; never fewer than the result limit
    pub fn pool_size(&self, limit: usize) -> i64 {
        i64::from(self.candidate_pool).max(limit as i64)
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub postgres: Arc<PostgresClient>,
    pub cache: Arc<CacheManager>,
    pub rate_limiter: Arc<MessageRateLimiter>,
    pub ranker: Ranker,
    pub sessions: SessionPolicy,
    pub discovery: DiscoveryLimits,
}

impl AppState {
    pub fn from_settings(
        settings: &Settings,
        postgres: Arc<PostgresClient>,
        cache: Arc<CacheManager>,
    ) -> Self {
        Self::build(
            postgres,
            cache,
            &settings.session,
            &settings.messaging,
            &settings.discovery,
        )
    }

    /// State with default session, messaging and discovery settings
    pub fn with_defaults(postgres: Arc<PostgresClient>, cache: Arc<CacheManager>) -> Self {
        Self::build(
            postgres,
            cache,
            &SessionSettings::default(),
            &MessagingSettings::default(),
            &DiscoverySettings::default(),
        )
    }

    fn build(
        postgres: Arc<PostgresClient>,
        cache: Arc<CacheManager>,
        session: &SessionSettings,
        messaging: &MessagingSettings,
        discovery: &DiscoverySettings,
    ) -> Self {
        let weights = ScoringWeights {
            distance: discovery.weights.distance,
            interests: discovery.weights.interests,
            verified: discovery.weights.verified,
            activity: discovery.weights.activity,
        };

        Self {
            postgres,
            cache,
            rate_limiter: Arc::new(MessageRateLimiter::new(
                messaging.rate_limit,
                Duration::from_secs(messaging.rate_window_secs),
            )),
            ranker: Ranker::new(weights),
            sessions: SessionPolicy::from(session),
            discovery: DiscoveryLimits {
                default_limit: discovery.default_limit,
                max_limit: discovery.max_limit,
                candidate_pool: discovery.candidate_pool,
            },
        }
    }

    /// Public user fields for every id in `ids`
    pub(crate) async fn summaries<I, S>(&self, ids: I) -> Result<HashMap<String, UserSummary>, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        Ok(self.postgres.user_summaries(&ids).await?)
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(health::configure)
            .configure(auth::configure)
            .configure(profiles::configure)
            .configure(matching::configure)
            .configure(moderation::configure)
            .configure(collaborations::configure)
            .configure(community::configure)
            .configure(events::configure)
            .configure(safety::configure)
            .configure(connections::configure)
            .configure(vault::configure)
            .configure(support::configure)
            .configure(statistics::configure),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_limit_defaults_and_clamps() {
        let limits = DiscoveryLimits { default_limit: 20, max_limit: 100, candidate_pool: 50 };
        assert_eq!(limits.resolve(None), 20);
        assert_eq!(limits.resolve(Some(500)), 100);
        assert_eq!(limits.resolve(Some(0)), 1);
        assert_eq!(limits.pool_size(20), 50);
        assert_eq!(limits.pool_size(100), 100);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let policy = SessionPolicy { ttl_days: 365, secure_cookie: false };
        let cookie = policy.cookie("abc");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(365)));
    }

    #[test]
    fn test_expired_cookie_clears_value() {
        let policy = SessionPolicy { ttl_days: 30, secure_cookie: true };
        let cookie = policy.expired_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
