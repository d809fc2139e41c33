use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::models::{Profile, ScoringWeights};

/// Shared interests beyond this count add nothing to the score
const INTEREST_SATURATION: f64 = 5.0;

/// Activity older than this scores zero
const ACTIVITY_HORIZON_HOURS: f64 = 30.0 * 24.0;

/// Score used when either side has no coordinates
const UNKNOWN_DISTANCE_SCORE: f64 = 0.5;

/// Calculate a discovery score (0-100) for a candidate as seen by `viewer`
///
/// score = (
///     distance_score  * w.distance +   # closer is better
///     interest_score  * w.interests +  # more shared interests/tags is better
///     verified_bonus  * w.verified +   # age or socials verified
///     activity_score  * w.activity     # recently active is better
/// ) * 100
pub fn calculate_discovery_score(
    viewer: &Profile,
    candidate: &Profile,
    distance_km: Option<f64>,
    max_distance_km: f64,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> (f64, Vec<String>) {
    let distance_score = calculate_distance_score(distance_km, max_distance_km);

    let shared = shared_interests(viewer, candidate);
    let interest_score = (shared.len() as f64).min(INTEREST_SATURATION) / INTEREST_SATURATION;

    let verified_score = if candidate.verified() { 1.0 } else { 0.0 };

    let activity_score = calculate_activity_score(candidate.last_active, now);

    let total = (distance_score * weights.distance
        + interest_score * weights.interests
        + verified_score * weights.verified
        + activity_score * weights.activity)
        * 100.0;

    (total.clamp(0.0, 100.0), shared)
}

/// Closer distance = higher score, exponentially decaying
#[inline]
fn calculate_distance_score(distance_km: Option<f64>, max_distance_km: f64) -> f64 {
    let Some(distance_km) = distance_km else {
        return UNKNOWN_DISTANCE_SCORE;
    };
    if max_distance_km <= 0.0 || distance_km >= max_distance_km {
        return 0.0;
    }
    (-distance_km / (max_distance_km * 0.5)).exp()
}

/// Full marks within the last day, then linear decay to zero over the horizon
#[inline]
fn calculate_activity_score(last_active: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (now - last_active).num_minutes() as f64 / 60.0;
    if hours <= 24.0 {
        return 1.0;
    }
    (1.0 - (hours - 24.0) / (ACTIVITY_HORIZON_HOURS - 24.0)).max(0.0)
}

/// Interests and tags the two profiles have in common, compared case-insensitively
///
/// Returned in the candidate's spelling and order, without duplicates.
pub fn shared_interests(viewer: &Profile, candidate: &Profile) -> Vec<String> {
    let mine: HashSet<String> = viewer
        .interests
        .iter()
        .chain(viewer.tags.iter())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    let mut seen = HashSet::new();
    candidate
        .interests
        .iter()
        .chain(candidate.tags.iter())
        .filter(|s| {
            let key = s.trim().to_lowercase();
            mine.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(interests: &[&str], verified: bool, last_active: DateTime<Utc>) -> Profile {
        let mut p = Profile::blank("u");
        p.interests = interests.iter().map(|s| s.to_string()).collect();
        p.age_verified = verified;
        p.last_active = last_active;
        p
    }

    #[test]
    fn test_shared_interests_case_insensitive() {
        let now = Utc::now();
        let viewer = profile(&["Photography", "travel"], false, now);
        let candidate = profile(&["photography", "Cooking", "TRAVEL", "travel"], false, now);
        assert_eq!(shared_interests(&viewer, &candidate), vec!["photography", "TRAVEL"]);
    }

    #[test]
    fn test_distance_score_bounds() {
        assert_eq!(calculate_distance_score(Some(150.0), 100.0), 0.0);
        assert!((calculate_distance_score(Some(0.0), 100.0) - 1.0).abs() < 1e-9);
        assert_eq!(calculate_distance_score(None, 100.0), UNKNOWN_DISTANCE_SCORE);
    }

    #[test]
    fn test_activity_score_decays() {
        let now = Utc::now();
        assert_eq!(calculate_activity_score(now - Duration::hours(2), now), 1.0);
        let mid = calculate_activity_score(now - Duration::days(15), now);
        assert!(mid > 0.0 && mid < 1.0);
        assert_eq!(calculate_activity_score(now - Duration::days(60), now), 0.0);
    }

    #[test]
    fn test_verified_close_active_outscores_stale_far() {
        let now = Utc::now();
        let weights = ScoringWeights::default();
        let viewer = profile(&["music"], false, now);
        let good = profile(&["music"], true, now);
        let weak = profile(&[], false, now - Duration::days(90));

        let (good_score, shared) =
            calculate_discovery_score(&viewer, &good, Some(1.0), 100.0, &weights, now);
        let (weak_score, _) =
            calculate_discovery_score(&viewer, &weak, Some(99.0), 100.0, &weights, now);

        assert_eq!(shared, vec!["music"]);
        assert!(good_score > weak_score);
        assert!((0.0..=100.0).contains(&good_score));
    }
}
