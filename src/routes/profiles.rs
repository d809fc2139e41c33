use actix_web::{web, HttpResponse};
use chrono::Utc;
use std::collections::HashMap;
use validator::Validate;

use super::{AppState, AuthUser};
use crate::core::{calculate_bounding_box, distance_between, shared_interests, within_radius, DiscoveryFilters};
use crate::error::ApiError;
use crate::models::{
    DiscoverQuery, LocationUpdateRequest, NearbyQuery, PaginationQuery, Profile,
    ProfileUpdateRequest, ProfileView, SavedProfileView, SimilarProfile, SuccessResponse, UserSummary,
};
use crate::services::CacheKey;

/// Radius used by `/profiles/nearby` when the query gives none
const DEFAULT_NEARBY_KM: f64 = 50.0;

const SIMILAR_LIMIT: i64 = 50;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Fixed segments first so they are not captured by `/profiles/{id}`
    cfg.service(
        web::scope("/profiles")
            .route("", web::get().to(list_profiles))
            .route("/me", web::get().to(get_my_profile))
            .route("/me", web::put().to(update_my_profile))
            .route("/discover", web::get().to(discover))
            .route("/nearby", web::get().to(nearby))
            .route("/location", web::put().to(update_location))
            .route("/by-location", web::get().to(locations))
            .route("/by-location/{location}", web::get().to(profiles_by_location))
            .route("/similar-interests", web::get().to(similar_interests))
            .route("/saved", web::get().to(saved_profiles))
            .route("/{user_id}/save", web::post().to(save_profile))
            .route("/{user_id}/save", web::delete().to(unsave_profile))
            .route("/{id}", web::get().to(get_profile)),
    );
}

/// The caller's profile, served from cache when possible
async fn own_profile(state: &AppState, user_id: &str) -> Result<Option<Profile>, ApiError> {
    let key = CacheKey::profile(user_id);
    if let Some(profile) = state.cache.get::<Profile>(&key).await {
        return Ok(Some(profile));
    }

    let profile = state.postgres.get_profile(user_id).await?;
    if let Some(profile) = &profile {
        if let Err(e) = state.cache.set(&key, profile).await {
            tracing::warn!("Failed to cache profile for {}: {}", user_id, e);
        }
    }
    Ok(profile)
}

/// Browsing other creators needs an age-verified profile
async fn require_age_verified(state: &AppState, user_id: &str) -> Result<Profile, ApiError> {
    match own_profile(state, user_id).await? {
        Some(profile) if profile.age_verified => Ok(profile),
        _ => Err(ApiError::forbidden("Age verification required")),
    }
}

fn to_views(
    profiles: Vec<Profile>,
    users: &HashMap<String, UserSummary>,
    viewer_coords: Option<(f64, f64)>,
) -> Vec<ProfileView> {
    profiles
        .into_iter()
        .map(|profile| {
            let distance_km = distance_between(viewer_coords, profile.coordinates());
            let user = users.get(&profile.user_id).cloned();
            ProfileView { profile, user, distance_km }
        })
        .collect()
}

/// GET /api/profiles
async fn list_profiles(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    let viewer = require_age_verified(&state, auth.id()).await?;

    let profiles = state
        .postgres
        .list_visible_profiles(auth.id(), query.limit_or(50), query.offset())
        .await?;
    let users = state.summaries(profiles.iter().map(|p| p.user_id.clone())).await?;

    Ok(HttpResponse::Ok().json(to_views(profiles, &users, viewer.coordinates())))
}

/// GET /api/profiles/me
async fn get_my_profile(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let profile = own_profile(&state, auth.id())
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/profiles/me
async fn update_my_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<ProfileUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let profile = state.postgres.upsert_profile(auth.id(), &req).await?;
    state.cache.forget(&CacheKey::profile(auth.id())).await;
    if req.display_name.is_some() {
        state.cache.forget(&CacheKey::session(&auth.sid)).await;
    }

    tracing::info!("Profile updated for {}", auth.id());
    Ok(HttpResponse::Ok().json(profile))
}

/// Path segment of `/profiles/{id}`
///
/// All-digit segments are numeric profile ids; anything else is a user id.
#[derive(Debug, PartialEq, Eq)]
enum ProfileRef {
    ProfileId(i64),
    UserId(String),
}

impl ProfileRef {
    fn parse(raw: String) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return ProfileRef::ProfileId(id);
            }
        }
        ProfileRef::UserId(raw)
    }
}

/// GET /api/profiles/{id}
///
/// Accepts either the numeric profile id or the owner's user id.
async fn get_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let viewer = require_age_verified(&state, auth.id()).await?;

    let profile = match ProfileRef::parse(path.into_inner()) {
        ProfileRef::ProfileId(id) => state.postgres.get_profile_by_id(id).await?,
        ProfileRef::UserId(user_id) => state.postgres.get_profile(&user_id).await?,
    }
    .filter(|p| p.is_visible || p.user_id == auth.id())
    .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    if profile.user_id != auth.id() {
        if state.postgres.is_blocked_either_way(auth.id(), &profile.user_id).await? {
            return Err(ApiError::not_found("Profile not found"));
        }
        let restrictions = state.postgres.restrictions_on(&profile.user_id, auth.id()).await?;
        if restrictions.no_profile_view {
            return Err(ApiError::forbidden("You are not allowed to view this profile"));
        }
    }

    let users = state.summaries([profile.user_id.clone()]).await?;
    let mut views = to_views(vec![profile], &users, viewer.coordinates());
    match views.pop() {
        Some(view) => Ok(HttpResponse::Ok().json(view)),
        None => Err(ApiError::not_found("Profile not found")),
    }
}

/// GET /api/profiles/discover
async fn discover(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<DiscoverQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let limit = state.discovery.resolve(query.limit);
    let filters = DiscoveryFilters::from_query(&query);
    let viewer = own_profile(&state, auth.id())
        .await?
        .unwrap_or_else(|| Profile::blank(auth.id()));

    let bbox = match (filters.max_distance_km, viewer.coordinates()) {
        (Some(max_km), Some((lat, lon))) => Some(calculate_bounding_box(lat, lon, max_km)),
        _ => None,
    };
    let candidates = state
        .postgres
        .discovery_candidates(auth.id(), &filters, bbox.as_ref(), state.discovery.pool_size(limit))
        .await?;
    let users = state.summaries(candidates.iter().map(|p| p.user_id.clone())).await?;

    let candidates = candidates
        .into_iter()
        .map(|profile| {
            let user = users.get(&profile.user_id).cloned();
            (profile, user)
        })
        .collect();

    let result = state.ranker.rank(&viewer, candidates, &filters, limit, Utc::now());

    tracing::info!(
        "Returning {} discovery profiles for user {} (from {} candidates)",
        result.profiles.len(),
        auth.id(),
        result.total_candidates
    );

    Ok(HttpResponse::Ok().json(result.profiles))
}

/// GET /api/profiles/nearby
async fn nearby(
    state: web::Data<AppState>,
    auth: AuthUser,
    query: web::Query<NearbyQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let radius = query.max_distance.unwrap_or(DEFAULT_NEARBY_KM);
    let center = (query.lat, query.lng);
    let bbox = calculate_bounding_box(query.lat, query.lng, radius);

    let profiles = state.postgres.profiles_in_bounding_box(auth.id(), &bbox).await?;
    let nearby = within_radius(center, radius, profiles, Profile::coordinates);
    let users = state.summaries(nearby.iter().map(|(p, _)| p.user_id.clone())).await?;

    let views: Vec<ProfileView> = nearby
        .into_iter()
        .map(|(profile, distance)| {
            let user = users.get(&profile.user_id).cloned();
            ProfileView { profile, user, distance_km: Some(distance) }
        })
        .collect();

    tracing::debug!("{} profiles within {} km of ({}, {})", views.len(), radius, query.lat, query.lng);
    Ok(HttpResponse::Ok().json(views))
}

/// PUT /api/profiles/location
async fn update_location(
    state: web::Data<AppState>,
    auth: AuthUser,
    req: web::Json<LocationUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let profile = state
        .postgres
        .update_location(auth.id(), req.latitude, req.longitude)
        .await?;
    state.cache.forget(&CacheKey::profile(auth.id())).await;

    Ok(HttpResponse::Ok().json(profile))
}

/// GET /api/profiles/by-location
async fn locations(state: web::Data<AppState>, _auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(state.postgres.location_counts().await?))
}

/// GET /api/profiles/by-location/{location}
async fn profiles_by_location(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let location = path.into_inner();
    let location = location.trim();
    if location.is_empty() {
        return Err(ApiError::bad_request("Location is required"));
    }

    let profiles = state.postgres.profiles_by_location(auth.id(), location).await?;
    let users = state.summaries(profiles.iter().map(|p| p.user_id.clone())).await?;

    Ok(HttpResponse::Ok().json(to_views(profiles, &users, None)))
}

/// GET /api/profiles/similar-interests
///
/// Ranked by number of shared interests and tags.
async fn similar_interests(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let viewer = match own_profile(&state, auth.id()).await? {
        Some(profile) => profile,
        None => return Ok(HttpResponse::Ok().json(Vec::<SimilarProfile>::new())),
    };

    let mut keys: Vec<String> = viewer
        .interests
        .iter()
        .chain(viewer.tags.iter())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    keys.sort_unstable();
    keys.dedup();

    let profiles = state
        .postgres
        .profiles_with_any_interest(auth.id(), &keys, SIMILAR_LIMIT)
        .await?;
    let users = state.summaries(profiles.iter().map(|p| p.user_id.clone())).await?;

    let mut similar: Vec<SimilarProfile> = profiles
        .into_iter()
        .map(|profile| {
            let shared = shared_interests(&viewer, &profile);
            let user = users.get(&profile.user_id).cloned();
            SimilarProfile { profile, user, shared_interests: shared }
        })
        .filter(|p| !p.shared_interests.is_empty())
        .collect();
    similar.sort_by(|a, b| b.shared_interests.len().cmp(&a.shared_interests.len()));

    Ok(HttpResponse::Ok().json(similar))
}

/// GET /api/profiles/saved
async fn saved_profiles(state: web::Data<AppState>, auth: AuthUser) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(saved_profile_views(&state, auth.id()).await?))
}

/// Saved profiles with owner summaries; shared with the bookmarks view
pub(crate) async fn saved_profile_views(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<SavedProfileView>, ApiError> {
    let saved = state.postgres.list_saved_profiles(user_id).await?;
    let ids: Vec<String> = saved.iter().map(|s| s.saved_user_id.clone()).collect();

    let users = state.summaries(ids.iter().cloned()).await?;
    let mut profiles: HashMap<String, Profile> = state
        .postgres
        .profiles_for_users(&ids)
        .await?
        .into_iter()
        .map(|p| (p.user_id.clone(), p))
        .collect();

    Ok(saved
        .into_iter()
        .map(|s| SavedProfileView {
            id: s.id,
            user: users.get(&s.saved_user_id).cloned(),
            profile: profiles.remove(&s.saved_user_id),
            saved_user_id: s.saved_user_id,
            created_at: s.created_at,
        })
        .collect())
}

/// POST /api/profiles/{user_id}/save
async fn save_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let target_id = path.into_inner();
    if target_id == auth.id() {
        return Err(ApiError::bad_request("Cannot save your own profile"));
    }
    state.postgres.require_user(&target_id).await?;

    let saved = state.postgres.save_profile(auth.id(), &target_id).await?;
    Ok(HttpResponse::Created().json(saved))
}

/// DELETE /api/profiles/{user_id}/save
async fn unsave_profile(
    state: web::Data<AppState>,
    auth: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    if !state.postgres.unsave_profile(auth.id(), &path).await? {
        return Err(ApiError::not_found("Saved profile not found"));
    }
    Ok(HttpResponse::Ok().json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_ref_parses_numeric_ids() {
        assert_eq!(ProfileRef::parse("5".into()), ProfileRef::ProfileId(5));
        assert_eq!(
            ProfileRef::parse("6f1c2a7e-93b1-4f0e-b1f4-2d9c1e8f7a10".into()),
            ProfileRef::UserId("6f1c2a7e-93b1-4f0e-b1f4-2d9c1e8f7a10".into())
        );
        assert_eq!(ProfileRef::parse("-3".into()), ProfileRef::UserId("-3".into()));
        assert_eq!(
            ProfileRef::parse("99999999999999999999".into()),
            ProfileRef::UserId("99999999999999999999".into())
        );
    }
}
