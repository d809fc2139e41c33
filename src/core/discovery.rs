use chrono::{DateTime, Utc};

use crate::core::{distance::distance_between, scoring::calculate_discovery_score};
use crate::models::{DiscoverQuery, DiscoveredProfile, Profile, ScoringWeights, UserSummary};

/// Query filters applied to discovery candidates after the SQL exclusions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoveryFilters {
    pub max_distance_km: Option<f64>,
    /// Matched against the candidate's niche, lowercased
    pub content_type: Option<String>,
    pub experience_levels: Vec<String>,
    pub availability: Vec<String>,
    pub travel_modes: Vec<String>,
    /// Matched against `monetization_expectation`
    pub monetization: Vec<String>,
}

impl DiscoveryFilters {
    pub fn from_query(query: &DiscoverQuery) -> Self {
        Self {
            max_distance_km: query.max_distance,
            content_type: query
                .content_type
                .as_deref()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
            experience_levels: parse_any_of(query.experience_level.as_deref()),
            availability: parse_any_of(query.availability.as_deref()),
            travel_modes: parse_any_of(query.travel_mode.as_deref()),
            monetization: parse_any_of(query.monetization.as_deref()),
        }
    }
}

/// Split a comma-separated list into lowercase, non-empty entries
pub fn parse_any_of(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[inline]
fn any_of(allowed: &[String], value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    match value {
        Some(v) => allowed.contains(&v.trim().to_lowercase()),
        None => false,
    }
}

/// Check a candidate against the query filters
///
/// The distance limit only applies when both sides have coordinates.
pub fn matches_filters(
    candidate: &Profile,
    viewer_coords: Option<(f64, f64)>,
    filters: &DiscoveryFilters,
) -> bool {
    if let Some(content_type) = &filters.content_type {
        let niche_matches = candidate
            .niche
            .as_deref()
            .map(|n| n.trim().to_lowercase() == *content_type)
            .unwrap_or(false);
        if !niche_matches {
            return false;
        }
    }

    if !any_of(&filters.experience_levels, candidate.experience_level.as_deref())
        || !any_of(&filters.availability, candidate.availability.as_deref())
        || !any_of(&filters.travel_modes, candidate.travel_mode.as_deref())
        || !any_of(&filters.monetization, candidate.monetization_expectation.as_deref())
    {
        return false;
    }

    if let Some(max_km) = filters.max_distance_km {
        if let Some(distance) = distance_between(viewer_coords, candidate.coordinates()) {
            if distance > max_km {
                return false;
            }
        }
    }

    true
}

/// Result of a ranking pass
#[derive(Debug)]
pub struct DiscoveryResult {
    pub profiles: Vec<DiscoveredProfile>,
    pub total_candidates: usize,
}

/// Filters and ranks discovery candidates
///
/// # Pipeline Stages
/// 1. Query filters (niche, any-of lists, distance)
/// 2. Weighted scoring
/// 3. Sort by score, then distance, and truncate
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: ScoringWeights,
}

impl Ranker {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn rank(
        &self,
        viewer: &Profile,
        candidates: Vec<(Profile, Option<UserSummary>)>,
        filters: &DiscoveryFilters,
        limit: usize,
        now: DateTime<Utc>,
    ) -> DiscoveryResult {
        let total_candidates = candidates.len();
        let viewer_coords = viewer.coordinates();
        let max_distance_km = filters
            .max_distance_km
            .unwrap_or(f64::from(viewer.max_distance.max(1)));

        let mut ranked: Vec<DiscoveredProfile> = candidates
            .into_iter()
            .filter(|(profile, _)| profile.user_id != viewer.user_id)
            .filter(|(profile, _)| matches_filters(profile, viewer_coords, filters))
            .map(|(profile, user)| {
                let distance_km = distance_between(viewer_coords, profile.coordinates());
                let (match_score, shared_interests) = calculate_discovery_score(
                    viewer,
                    &profile,
                    distance_km,
                    max_distance_km,
                    &self.weights,
                    now,
                );
                DiscoveredProfile {
                    profile,
                    user,
                    distance_km,
                    match_score,
                    shared_interests,
                }
            })
            .collect();

        // Score descending, then known distances nearest first
        ranked.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| match (a.distance_km, b.distance_km) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });

        ranked.truncate(limit);

        DiscoveryResult {
            profiles: ranked,
            total_candidates,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}
