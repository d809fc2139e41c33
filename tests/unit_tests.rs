// Unit tests for Collabr core logic

use chrono::{Duration, NaiveDate, Utc};
use collabr::core::{
    calculate_discovery_score, profile_completion, response_rate, shared_interests,
    distance::{calculate_bounding_box, haversine_distance, is_within_bounding_box, within_radius},
    workspace::{sort_shoot_dates, validate_revenue_split, validate_roles},
    DiscoveryFilters, RecentPeriod, Ranker, WorkspaceRuleError,
};
use collabr::models::{
    Collaboration, CollaborationSide, CollaborationStatus, DeletedPost, Profile, RevenueShare,
    RevenueSplit, ScoringWeights, ShootDate, SplitType, WorkspaceRole,
};

fn profile_at(user_id: &str, lat: f64, lon: f64) -> Profile {
    let mut p = Profile::blank(user_id);
    p.latitude = Some(lat);
    p.longitude = Some(lon);
    p
}

fn collaboration(status: CollaborationStatus) -> Collaboration {
    Collaboration {
        id: 7,
        requester_id: "alice".into(),
        receiver_id: "bob".into(),
        status,
        message: "Joint shoot in Lisbon?".into(),
        acknowledged_by_requester: false,
        acknowledged_by_receiver: false,
        created_at: Utc::now(),
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(52.52, 13.405, 52.52, 13.405);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_london_to_paris() {
    // Roughly 344 km
    let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
    assert!(distance > 330.0 && distance < 360.0);
}

#[test]
fn test_bounding_box_creation() {
    let bbox = calculate_bounding_box(52.52, 13.405, 10.0);

    assert!(bbox.min_lat < 52.52);
    assert!(bbox.max_lat > 52.52);
    assert!(bbox.min_lon < 13.405);
    assert!(bbox.max_lon > 13.405);

    // 10 km / 111 km per degree
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);
}

#[test]
fn test_bounding_box_near_pole_is_clamped() {
    let bbox = calculate_bounding_box(89.99, 0.0, 50.0);
    assert_eq!(bbox.max_lat, 90.0);
    assert_eq!(bbox.min_lon, -180.0);
    assert_eq!(bbox.max_lon, 180.0);
}

#[test]
fn test_point_within_bbox() {
    let bbox = calculate_bounding_box(52.52, 13.405, 10.0);

    assert!(is_within_bounding_box(52.52, 13.405, &bbox));
    assert!(is_within_bounding_box(52.53, 13.41, &bbox));
    assert!(!is_within_bounding_box(48.1351, 11.582, &bbox));
    assert!(!is_within_bounding_box(bbox.max_lat + 0.01, 13.405, &bbox));
}

#[test]
fn test_within_radius_sorts_and_drops_unknown() {
    let center = (51.5074, -0.1278);
    let points = vec![
        ("paris", Some((48.8566, 2.3522))),
        ("camden", Some((51.539, -0.1426))),
        ("nowhere", None),
        ("soho", Some((51.5136, -0.1365))),
    ];

    let nearby = within_radius(center, 20.0, points, |(_, c)| *c);
    let names: Vec<&str> = nearby.iter().map(|((name, _), _)| *name).collect();

    assert_eq!(names, vec!["soho", "camden"]);
    assert!(nearby[0].1 < nearby[1].1);
}

#[test]
fn test_shared_interests_include_tags() {
    let mut viewer = Profile::blank("me");
    viewer.interests = vec!["Photography".into()];
    viewer.tags = vec!["travel".into()];

    let mut candidate = Profile::blank("them");
    candidate.interests = vec!["cooking".into()];
    candidate.tags = vec!["Travel".into(), "photography".into()];

    assert_eq!(shared_interests(&viewer, &candidate), vec!["Travel", "photography"]);
}

#[test]
fn test_discovery_score_weights_verification() {
    let now = Utc::now();
    let weights = ScoringWeights::default();
    let viewer = Profile::blank("me");

    let mut verified = Profile::blank("v");
    verified.socials_verified = true;
    let unverified = Profile::blank("u");

    let (a, _) = calculate_discovery_score(&viewer, &verified, Some(5.0), 100.0, &weights, now);
    let (b, _) = calculate_discovery_score(&viewer, &unverified, Some(5.0), 100.0, &weights, now);

    assert!((a - b - weights.verified * 100.0).abs() < 1e-6);
}

#[test]
fn test_discovery_score_unknown_distance_is_neutral() {
    let now = Utc::now();
    let weights = ScoringWeights {
        distance: 1.0,
        interests: 0.0,
        verified: 0.0,
        activity: 0.0,
    };
    let viewer = Profile::blank("me");
    let candidate = Profile::blank("them");

    let (score, _) = calculate_discovery_score(&viewer, &candidate, None, 100.0, &weights, now);
    assert!((score - 50.0).abs() < 1e-9);
}

#[test]
fn test_ranker_respects_distance_filter() {
    let now = Utc::now();
    let viewer = profile_at("me", 51.5074, -0.1278);
    let filters = DiscoveryFilters {
        max_distance_km: Some(25.0),
        ..Default::default()
    };

    let candidates = vec![
        (profile_at("paris", 48.8566, 2.3522), None),
        (profile_at("soho", 51.5136, -0.1365), None),
        (Profile::blank("unknown"), None),
    ];

    let result = Ranker::default().rank(&viewer, candidates, &filters, 10, now);
    let ids: Vec<&str> = result.profiles.iter().map(|p| p.profile.user_id.as_str()).collect();

    assert_eq!(result.total_candidates, 3);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"soho"));
    assert!(ids.contains(&"unknown"));
    assert!(!ids.contains(&"paris"));
}

#[test]
fn test_ranker_puts_known_distance_first_on_tie() {
    let now = Utc::now();
    let weights = ScoringWeights {
        distance: 0.0,
        interests: 0.0,
        verified: 0.0,
        activity: 1.0,
    };
    let viewer = profile_at("me", 51.5074, -0.1278);
    let candidates = vec![
        (Profile::blank("unknown"), None),
        (profile_at("near", 51.51, -0.13), None),
    ];

    let result = Ranker::new(weights).rank(&viewer, candidates, &DiscoveryFilters::default(), 10, now);
    assert_eq!(result.profiles[0].profile.user_id, "near");
    assert_eq!(result.profiles[1].distance_km, None);
}

#[test]
fn test_profile_completion_counts_nine_fields() {
    let mut p = Profile::blank("u");
    p.bio = Some("Portrait photographer".into());
    p.niche = Some("photography".into());
    p.location = Some("Lisbon".into());
    p.birth_date = NaiveDate::from_ymd_opt(1994, 5, 17);
    p.gender = Some("female".into());
    p.looking_for = Some("collaborators".into());
    p.interests = vec!["travel".into()];
    p.occupation = Some("photographer".into());
    assert_eq!(profile_completion(Some(&p)), 88);

    p.education = Some("BA Fine Art".into());
    assert_eq!(profile_completion(Some(&p)), 100);
}

#[test]
fn test_response_rate_is_capped() {
    assert_eq!(response_rate(3, 12), 25);
    assert_eq!(response_rate(40, 10), 100);
    assert_eq!(response_rate(0, 0), 0);
}

#[test]
fn test_recent_period_windows() {
    let now = Utc::now();
    assert_eq!(RecentPeriod::default(), RecentPeriod::Day);
    assert_eq!("week".parse::<RecentPeriod>().unwrap().threshold(now), now - Duration::weeks(1));
    assert!("fortnight".parse::<RecentPeriod>().is_err());
}

#[test]
fn test_collaboration_sides() {
    let collab = collaboration(CollaborationStatus::Pending);
    assert_eq!(collab.side_of("alice"), Some(CollaborationSide::Requester));
    assert_eq!(collab.side_of("bob"), Some(CollaborationSide::Receiver));
    assert_eq!(collab.side_of("mallory"), None);
}

#[test]
fn test_revenue_split_equal_type_ignores_total() {
    let collab = collaboration(CollaborationStatus::Accepted);
    let split = RevenueSplit {
        split_type: SplitType::Equal,
        splits: vec![
            RevenueShare { user_id: "alice".into(), percentage: Some(80.0), amount: None },
            RevenueShare { user_id: "bob".into(), percentage: Some(80.0), amount: None },
        ],
    };
    assert!(validate_revenue_split(&split, &collab).is_ok());
}

#[test]
fn test_roles_must_be_participants() {
    let collab = collaboration(CollaborationStatus::Accepted);
    let roles = vec![
        WorkspaceRole { user_id: "alice".into(), role: "model".into(), responsibilities: vec![] },
        WorkspaceRole { user_id: "carol".into(), role: "makeup".into(), responsibilities: vec![] },
    ];
    assert_eq!(
        validate_roles(&roles, &collab),
        Err(WorkspaceRuleError::NotAParticipant("carol".into()))
    );
}

#[test]
fn test_shoot_dates_sorted() {
    let date = |d| ShootDate {
        date: NaiveDate::from_ymd_opt(2026, 3, d).unwrap(),
        description: String::new(),
    };
    let sorted = sort_shoot_dates(vec![date(20), date(2), date(11)]);
    let days: Vec<String> = sorted.iter().map(|d| d.date.to_string()).collect();
    assert_eq!(days, vec!["2026-03-02", "2026-03-11", "2026-03-20"]);
}

#[test]
fn test_deleted_post_expiry() {
    let now = Utc::now();
    let mut deleted = DeletedPost {
        id: 1,
        user_id: "alice".into(),
        original_post_id: Some(10),
        topic_id: Some(1),
        title: Some("Old post".into()),
        content: Some("...".into()),
        deleted_at: now - Duration::days(31),
        expires_at: now - Duration::days(1),
        permanently_deleted: false,
    };
    assert!(deleted.is_expired(now));

    deleted.expires_at = now + Duration::days(29);
    assert!(!deleted.is_expired(now));
}
